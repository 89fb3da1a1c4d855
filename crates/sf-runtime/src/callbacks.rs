use sf_core::{FlowError, FlowValue};

/// Receives emitted and returned values while the engine walks a schema.
///
/// Both hooks run synchronously in walk order. Returning an error aborts the
/// operation in progress; the caller's flow state is left as it was.
pub trait FlowCallbacks {
    fn on_emit(&mut self, value: &FlowValue) -> Result<(), FlowError>;
    fn on_return(&mut self, value: &FlowValue) -> Result<(), FlowError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl FlowCallbacks for NoopCallbacks {
    fn on_emit(&mut self, _value: &FlowValue) -> Result<(), FlowError> {
        Ok(())
    }

    fn on_return(&mut self, _value: &FlowValue) -> Result<(), FlowError> {
        Ok(())
    }
}

/// Records every callback in order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollectingCallbacks {
    pub emitted: Vec<FlowValue>,
    pub returned: Option<FlowValue>,
}

impl CollectingCallbacks {
    pub fn is_finished(&self) -> bool {
        self.returned.is_some()
    }
}

impl FlowCallbacks for CollectingCallbacks {
    fn on_emit(&mut self, value: &FlowValue) -> Result<(), FlowError> {
        self.emitted.push(value.clone());
        Ok(())
    }

    fn on_return(&mut self, value: &FlowValue) -> Result<(), FlowError> {
        self.returned = Some(value.clone());
        Ok(())
    }
}

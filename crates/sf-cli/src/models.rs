use sf_core::{FlowValue, Values};
use sf_runtime::FormView;

#[derive(Debug, Clone)]
pub(crate) struct LoadedSchema {
    /// `schema-file:<absolute path>`, stored in saved states.
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) schema_json: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Form,
    Return,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) emitted: Vec<FlowValue>,
    pub(crate) form: Option<FormView>,
    pub(crate) returned: Option<FlowValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TuiCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}

pub(crate) struct TuiCommandContext<'a> {
    pub(crate) state_file: &'a str,
    pub(crate) schema: &'a LoadedSchema,
    pub(crate) inputs: &'a Values,
}

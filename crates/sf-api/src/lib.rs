use serde::{Deserialize, Serialize};
use sf_compiler::compile_schema_from_json;
use sf_core::{FlowError, FlowState, FlowValue, Values};
use sf_runtime::{
    CollectingCallbacks, FlowEngine, FlowEngineOptions, FormView, DEFAULT_WALK_GUARD,
};
use tracing::debug;

pub const STATE_SCHEMA_V1: &str = "stepflow-state.v1";

pub const STATE_SCHEMA: &str = "STATE_SCHEMA";
pub const STATE_INVALID: &str = "STATE_INVALID";
pub const SESSION_FINISHED: &str = "SESSION_FINISHED";

/// A flow state as it is written to disk or sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEnvelope {
    pub schema_version: String,
    /// Names the schema the state was produced against; hosts decide its format.
    pub schema_ref: String,
    pub state: FlowState,
    /// Set when the session ran with a non-default walk guard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_guard: Option<usize>,
}

impl StateEnvelope {
    pub fn new(schema_ref: impl Into<String>, state: FlowState) -> Self {
        Self {
            schema_version: STATE_SCHEMA_V1.to_string(),
            schema_ref: schema_ref.into(),
            state,
            walk_guard: None,
        }
    }

    pub fn to_json(&self) -> Result<String, FlowError> {
        serde_json::to_string(self).map_err(|error| {
            FlowError::new(
                STATE_INVALID,
                format!("Flow state cannot be encoded: {}", error),
            )
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, FlowError> {
        let envelope: Self = serde_json::from_str(raw).map_err(|error| {
            FlowError::new(STATE_INVALID, format!("Flow state is invalid: {}", error))
        })?;
        envelope.check_version()?;
        Ok(envelope)
    }

    fn check_version(&self) -> Result<(), FlowError> {
        if self.schema_version != STATE_SCHEMA_V1 {
            return Err(FlowError::new(
                STATE_SCHEMA,
                format!("Unsupported flow state schema: {}", self.schema_version),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CreateSessionFromJsonOptions {
    pub schema_json: String,
    pub schema_ref: String,
    pub inputs: Values,
    pub walk_guard: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResumeSessionFromJsonOptions {
    pub schema_json: String,
    pub envelope: StateEnvelope,
    /// Overrides the guard stored in the envelope.
    pub walk_guard: Option<usize>,
}

pub fn create_engine_from_json(
    schema_json: &str,
    walk_guard: Option<usize>,
) -> Result<FlowEngine, FlowError> {
    let schema = compile_schema_from_json(schema_json)?;
    let mut options = FlowEngineOptions::default();
    if let Some(walk_guard) = walk_guard {
        options.walk_guard = walk_guard;
    }
    Ok(FlowEngine::with_options(schema, options))
}

pub fn create_session_from_json(
    options: CreateSessionFromJsonOptions,
) -> Result<FlowSession, FlowError> {
    let engine = create_engine_from_json(&options.schema_json, options.walk_guard)?;
    FlowSession::start(engine, options.schema_ref, options.inputs)
}

pub fn resume_session_from_json(
    options: ResumeSessionFromJsonOptions,
) -> Result<FlowSession, FlowError> {
    let walk_guard = options.walk_guard.or(options.envelope.walk_guard);
    let engine = create_engine_from_json(&options.schema_json, walk_guard)?;
    FlowSession::resume(engine, options.envelope)
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Form(FormView),
    Returned(FlowValue),
}

/// What one session operation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStep {
    pub emitted: Vec<FlowValue>,
    pub outcome: StepOutcome,
}

/// One running flow: an engine plus the state it is currently at.
#[derive(Debug, Clone)]
pub struct FlowSession {
    engine: FlowEngine,
    schema_ref: String,
    state: FlowState,
    emitted: Vec<FlowValue>,
    returned: Option<FlowValue>,
}

impl FlowSession {
    pub fn start(
        engine: FlowEngine,
        schema_ref: impl Into<String>,
        inputs: Values,
    ) -> Result<Self, FlowError> {
        let mut callbacks = CollectingCallbacks::default();
        let state = engine.initialize(inputs, &mut callbacks)?;
        let schema_ref = schema_ref.into();
        debug!(schema_ref = %schema_ref, emitted = callbacks.emitted.len(), "session started");
        Ok(Self {
            engine,
            schema_ref,
            state,
            emitted: callbacks.emitted,
            returned: None,
        })
    }

    /// Rebuilds a session from a saved envelope. The current cursor must still
    /// resolve to a form in `engine`'s schema.
    pub fn resume(engine: FlowEngine, envelope: StateEnvelope) -> Result<Self, FlowError> {
        envelope.check_version()?;
        engine.current_form(&envelope.state)?;
        debug!(schema_ref = %envelope.schema_ref, depth = envelope.state.depth(), "session resumed");
        Ok(Self {
            engine,
            schema_ref: envelope.schema_ref,
            state: envelope.state,
            emitted: Vec::new(),
            returned: None,
        })
    }

    pub fn engine(&self) -> &FlowEngine {
        &self.engine
    }

    pub fn schema_ref(&self) -> &str {
        &self.schema_ref
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Values emitted by the most recent operation.
    pub fn emitted(&self) -> &[FlowValue] {
        &self.emitted
    }

    pub fn returned(&self) -> Option<&FlowValue> {
        self.returned.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.returned.is_some()
    }

    pub fn form(&self) -> Result<FormView, FlowError> {
        self.engine.current_form(&self.state)
    }

    pub fn submit(&mut self, values: Values) -> Result<SessionStep, FlowError> {
        if self.is_finished() {
            return Err(FlowError::new(
                SESSION_FINISHED,
                "Flow already returned; go back before submitting again.",
            ));
        }
        let mut callbacks = CollectingCallbacks::default();
        let next = self.engine.advance(&self.state, values, &mut callbacks)?;
        self.state = next;
        self.emitted = callbacks.emitted.clone();

        let outcome = match callbacks.returned {
            Some(value) => {
                self.returned = Some(value.clone());
                StepOutcome::Returned(value)
            }
            None => StepOutcome::Form(self.form()?),
        };
        Ok(SessionStep {
            emitted: callbacks.emitted,
            outcome,
        })
    }

    /// Steps back one form, keeping `values` as the entries of the form being left.
    /// A finished session becomes editable again.
    pub fn back(&mut self, values: Values) -> Result<FormView, FlowError> {
        self.state = self.engine.rewind(&self.state, values)?;
        self.emitted.clear();
        self.returned = None;
        self.form()
    }

    pub fn save_state(&self) -> StateEnvelope {
        let mut envelope = StateEnvelope::new(self.schema_ref.clone(), self.state.clone());
        let walk_guard = self.engine.options().walk_guard;
        if walk_guard != DEFAULT_WALK_GUARD {
            envelope.walk_guard = Some(walk_guard);
        }
        envelope
    }

    /// Records `values` as the current form's entries, then saves. Used to keep
    /// edits that were typed but not submitted.
    pub fn save_state_with(&mut self, values: Values) -> Result<StateEnvelope, FlowError> {
        if !values.is_empty() {
            self.state = self.engine.record(&self.state, values)?;
        }
        Ok(self.save_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::{values, Position, FLOW_INVALID_PATH};

    const SIGNUP: &str = r##"[
        {"form": {"values": "#{ name: [\"\", []] }", "render": {"title": "Name"}}},
        {"emit": "#{ greeted: name }"},
        {"form": {"values": "#{ age: [18, [name]] }", "render": {"title": "Age for ${name}"}}},
        {"return": "#{ name: name, age: age }"}
    ]"##;

    fn start() -> FlowSession {
        create_session_from_json(CreateSessionFromJsonOptions {
            schema_json: SIGNUP.to_string(),
            schema_ref: "signup".to_string(),
            inputs: Values::new(),
            walk_guard: None,
        })
        .expect("session should start")
    }

    #[test]
    fn session_walks_to_return() {
        let mut session = start();
        assert!(session.emitted().is_empty());
        assert_eq!(session.form().expect("form").path, vec![Position::List { slot: 0 }]);

        let step = session
            .submit(values([("name", "Ann")]))
            .expect("submit should pass");
        assert_eq!(
            step.emitted,
            vec![FlowValue::Map(values([("greeted", "Ann")]))]
        );
        let StepOutcome::Form(view) = step.outcome else {
            panic!("expected a form");
        };
        assert_eq!(view.default_of("age"), FlowValue::from(18i64));

        let step = session
            .submit(values([("age", 30i64)]))
            .expect("submit should pass");
        assert!(step.emitted.is_empty());
        assert_eq!(
            step.outcome,
            StepOutcome::Returned(FlowValue::Map(values([
                ("name", FlowValue::from("Ann")),
                ("age", FlowValue::from(30i64))
            ])))
        );
        assert!(session.is_finished());

        let error = session
            .submit(values([("age", 31i64)]))
            .expect_err("finished session should refuse submit");
        assert_eq!(error.code, SESSION_FINISHED);

        let view = session.back(Values::new()).expect("back should pass");
        assert_eq!(view.default_of("name"), FlowValue::from("Ann"));
        assert!(!session.is_finished());
    }

    #[test]
    fn saved_state_resumes_with_entries() {
        let mut session = start();
        session
            .submit(values([("name", "Ann")]))
            .expect("submit should pass");
        session
            .back(values([("age", 44i64)]))
            .expect("back should pass");
        session
            .submit(values([("name", "Ann")]))
            .expect("submit should pass");

        let json = session.save_state().to_json().expect("state should encode");
        let envelope = StateEnvelope::from_json(&json).expect("state should decode");
        assert_eq!(envelope.schema_ref, "signup");

        let resumed = resume_session_from_json(ResumeSessionFromJsonOptions {
            schema_json: SIGNUP.to_string(),
            envelope,
            walk_guard: None,
        })
        .expect("session should resume");
        let view = resumed.form().expect("form");
        assert_eq!(view.default_of("age"), FlowValue::from(44i64));
        assert!(view.field("age").expect("age").reused);
    }

    #[test]
    fn envelopes_are_validated() {
        let error = StateEnvelope::from_json("{").expect_err("bad json should fail");
        assert_eq!(error.code, STATE_INVALID);

        let mut envelope = start().save_state();
        envelope.schema_version = "stepflow-state.v0".to_string();
        let json = envelope.to_json().expect("state should encode");
        let error = StateEnvelope::from_json(&json).expect_err("old schema should fail");
        assert_eq!(error.code, STATE_SCHEMA);

        let mut envelope = start().save_state();
        envelope.state.cursors[0].path = vec![Position::List { slot: 1 }];
        let engine = create_engine_from_json(SIGNUP, None).expect("engine should compile");
        let error = FlowSession::resume(engine, envelope).expect_err("emit is not a form");
        assert_eq!(error.code, FLOW_INVALID_PATH);
    }

    #[test]
    fn walk_guard_option_reaches_the_engine() {
        let engine = create_engine_from_json(SIGNUP, Some(7)).expect("engine should compile");
        assert_eq!(engine.options().walk_guard, 7);
    }

    #[test]
    fn walk_guard_survives_save_and_resume() {
        let session = create_session_from_json(CreateSessionFromJsonOptions {
            schema_json: SIGNUP.to_string(),
            schema_ref: "signup".to_string(),
            inputs: Values::new(),
            walk_guard: Some(9),
        })
        .expect("session should start");
        let json = session.save_state().to_json().expect("state should encode");
        assert!(json.contains("\"walkGuard\":9"));
        let envelope = StateEnvelope::from_json(&json).expect("state should decode");

        let resumed = resume_session_from_json(ResumeSessionFromJsonOptions {
            schema_json: SIGNUP.to_string(),
            envelope: envelope.clone(),
            walk_guard: None,
        })
        .expect("session should resume");
        assert_eq!(resumed.engine().options().walk_guard, 9);

        let overridden = resume_session_from_json(ResumeSessionFromJsonOptions {
            schema_json: SIGNUP.to_string(),
            envelope,
            walk_guard: Some(40),
        })
        .expect("session should resume");
        assert_eq!(overridden.engine().options().walk_guard, 40);

        let plain = start().save_state().to_json().expect("state should encode");
        assert!(!plain.contains("walkGuard"));
    }

    #[test]
    fn save_state_with_keeps_unsubmitted_edits() {
        let mut session = start();
        session
            .submit(values([("name", "Ann")]))
            .expect("submit should pass");
        let envelope = session
            .save_state_with(values([("age", 52i64)]))
            .expect("save should pass");
        assert_eq!(envelope.state.depth(), 2);
        assert_eq!(session.state(), &envelope.state);

        let json = envelope.to_json().expect("state should encode");
        let resumed = resume_session_from_json(ResumeSessionFromJsonOptions {
            schema_json: SIGNUP.to_string(),
            envelope: StateEnvelope::from_json(&json).expect("state should decode"),
            walk_guard: None,
        })
        .expect("session should resume");
        let view = resumed.form().expect("form");
        assert_eq!(view.default_of("age"), FlowValue::from(52i64));
        assert!(view.field("age").expect("age").reused);

        let untouched = session
            .save_state_with(Values::new())
            .expect("save should pass");
        assert_eq!(untouched.state, envelope.state);
    }
}

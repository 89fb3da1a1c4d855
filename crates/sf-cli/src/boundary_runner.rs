use sf_api::{FlowSession, SessionStep, StepOutcome};
use sf_core::{format_path, FlowError};

use crate::{BoundaryEvent, BoundaryResult};

/// The boundary a session currently sits at, with whatever its last operation emitted.
pub(crate) fn boundary_from_session(session: &FlowSession) -> Result<BoundaryResult, FlowError> {
    let emitted = session.emitted().to_vec();
    if let Some(value) = session.returned() {
        return Ok(BoundaryResult {
            event: BoundaryEvent::Return,
            emitted,
            form: None,
            returned: Some(value.clone()),
        });
    }
    Ok(BoundaryResult {
        event: BoundaryEvent::Form,
        emitted,
        form: Some(session.form()?),
        returned: None,
    })
}

pub(crate) fn boundary_from_step(step: SessionStep) -> BoundaryResult {
    match step.outcome {
        StepOutcome::Form(view) => BoundaryResult {
            event: BoundaryEvent::Form,
            emitted: step.emitted,
            form: Some(view),
            returned: None,
        },
        StepOutcome::Returned(value) => BoundaryResult {
            event: BoundaryEvent::Return,
            emitted: step.emitted,
            form: None,
            returned: Some(value),
        },
    }
}

pub(crate) fn boundary_lines(boundary: &BoundaryResult, state_out: Option<&str>) -> Vec<String> {
    let mut lines = vec!["RESULT:OK".to_string()];
    lines.push(match boundary.event {
        BoundaryEvent::Form => "EVENT:FORM".to_string(),
        BoundaryEvent::Return => "EVENT:RETURN".to_string(),
    });

    for value in &boundary.emitted {
        lines.push(format!(
            "EMIT_JSON:{}",
            serde_json::to_string(value).expect("flow value json")
        ));
    }

    if let Some(form) = &boundary.form {
        lines.push(format!(
            "FORM_PATH_JSON:{}",
            serde_json::to_string(&format_path(&form.path)).expect("string json")
        ));
        for field in &form.fields {
            lines.push(format!(
                "FIELD:{}|{}",
                field.name,
                serde_json::to_string(&field.default).expect("flow value json")
            ));
        }
    }

    if let Some(value) = &boundary.returned {
        lines.push(format!(
            "RETURN_JSON:{}",
            serde_json::to_string(value).expect("flow value json")
        ));
    }

    lines.push(format!("STATE_OUT:{}", state_out.unwrap_or("NONE")));
    lines
}

pub(crate) fn emit_boundary(boundary: &BoundaryResult, state_out: Option<&str>) {
    for line in boundary_lines(boundary, state_out) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod boundary_runner_tests {
    use super::*;
    use sf_api::{create_session_from_json, CreateSessionFromJsonOptions};
    use sf_core::{values, Values};

    const FLOW: &str = r##"[
        {"emit": "#{ started: true }"},
        {"form": {"values": "#{ name: [\"\", []], age: [18, []] }"}},
        {"return": "#{ name: name }"}
    ]"##;

    fn session() -> FlowSession {
        create_session_from_json(CreateSessionFromJsonOptions {
            schema_json: FLOW.to_string(),
            schema_ref: "inline".to_string(),
            inputs: Values::new(),
            walk_guard: None,
        })
        .expect("session should start")
    }

    #[test]
    fn form_boundary_lists_emits_path_and_fields() {
        let boundary = boundary_from_session(&session()).expect("boundary should resolve");
        assert_eq!(boundary.event, BoundaryEvent::Form);

        let lines = boundary_lines(&boundary, Some("/tmp/state.json"));
        assert_eq!(
            lines,
            vec![
                "RESULT:OK",
                "EVENT:FORM",
                "EMIT_JSON:{\"started\":true}",
                "FORM_PATH_JSON:\"1\"",
                "FIELD:age|18",
                "FIELD:name|\"\"",
                "STATE_OUT:/tmp/state.json",
            ]
        );
    }

    #[test]
    fn return_boundary_carries_value_and_no_state() {
        let mut session = session();
        let step = session
            .submit(values([("name", "Ann")]))
            .expect("submit should pass");
        let boundary = boundary_from_step(step);
        assert_eq!(boundary.event, BoundaryEvent::Return);
        assert!(boundary.emitted.is_empty());

        let lines = boundary_lines(&boundary, None);
        assert_eq!(
            lines,
            vec![
                "RESULT:OK",
                "EVENT:RETURN",
                "RETURN_JSON:{\"name\":\"Ann\"}",
                "STATE_OUT:NONE",
            ]
        );

        let from_session = boundary_from_session(&session).expect("boundary should resolve");
        assert_eq!(from_session.event, BoundaryEvent::Return);
    }
}

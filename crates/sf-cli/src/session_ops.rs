use std::path::Path;

use sf_api::{
    create_session_from_json, resume_session_from_json, CreateSessionFromJsonOptions,
    FlowSession, ResumeSessionFromJsonOptions,
};
use sf_core::{FlowError, Values};

use crate::{
    emit_boundary, load_flow_state, load_source_by_ref, map_cli_values_invalid, save_flow_state,
    BoundaryEvent, BoundaryResult, LoadedSchema,
};

/// Parses a `--values`/`--inputs` argument, which must be a JSON object.
pub(crate) fn parse_values_arg(raw: &str) -> Result<Values, FlowError> {
    serde_json::from_str(raw).map_err(map_cli_values_invalid)
}

pub(crate) fn parse_optional_values_arg(raw: Option<&str>) -> Result<Values, FlowError> {
    raw.map(parse_values_arg)
        .transpose()
        .map(Option::unwrap_or_default)
}

pub(crate) fn create_session_for_schema(
    schema: &LoadedSchema,
    inputs: Values,
    walk_guard: Option<usize>,
) -> Result<FlowSession, FlowError> {
    create_session_from_json(CreateSessionFromJsonOptions {
        schema_json: schema.schema_json.clone(),
        schema_ref: schema.id.clone(),
        inputs,
        walk_guard,
    })
}

pub(crate) fn save_session_state(path: &Path, session: &FlowSession) -> Result<(), FlowError> {
    save_flow_state(path, &session.save_state())
}

/// Saves with `pending` folded into the current form's entries.
pub(crate) fn save_session_state_with(
    path: &Path,
    session: &mut FlowSession,
    pending: Values,
) -> Result<(), FlowError> {
    save_flow_state(path, &session.save_state_with(pending)?)
}

pub(crate) fn load_session_from_state_for_ref(
    path: &Path,
) -> Result<(LoadedSchema, FlowSession), FlowError> {
    let envelope = load_flow_state(path)?;
    let schema = load_source_by_ref(&envelope.schema_ref)?;
    let session = resume_session_from_json(ResumeSessionFromJsonOptions {
        schema_json: schema.schema_json.clone(),
        envelope,
        walk_guard: None,
    })?;
    Ok((schema, session))
}

pub(crate) fn load_session_from_state_for_schema(
    path: &Path,
    schema: &LoadedSchema,
) -> Result<FlowSession, FlowError> {
    let envelope = load_flow_state(path)?;
    if envelope.schema_ref != schema.id {
        return Err(FlowError::new(
            "TUI_STATE_SCHEMA_MISMATCH",
            format!(
                "State schema mismatch. expected={} actual={}",
                schema.id, envelope.schema_ref
            ),
        ));
    }
    resume_session_from_json(ResumeSessionFromJsonOptions {
        schema_json: schema.schema_json.clone(),
        envelope,
        walk_guard: None,
    })
}

/// Saves the session when it stopped at a form; a return leaves nothing to resume.
pub(crate) fn emit_boundary_with_saved_state(
    session: &FlowSession,
    boundary: BoundaryResult,
    state_out: &str,
) -> Result<i32, FlowError> {
    if boundary.event == BoundaryEvent::Form {
        save_session_state(Path::new(state_out), session)?;
        emit_boundary(&boundary, Some(state_out));
        return Ok(0);
    }

    emit_boundary(&boundary, None);
    Ok(0)
}

#[cfg(test)]
mod session_ops_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::{boundary_from_session, load_source_by_schema_file};
    use sf_core::{values, FlowValue};

    #[test]
    fn values_args_must_be_json_objects() {
        let parsed = parse_values_arg(r#"{"name":"Ann","age":30}"#).expect("object should parse");
        assert_eq!(parsed.get("age"), Some(&FlowValue::from(30i64)));

        let error = parse_values_arg("[1]").expect_err("array should fail");
        assert_eq!(error.code, "CLI_VALUES_INVALID");
        let error = parse_values_arg("{").expect_err("broken json should fail");
        assert_eq!(error.code, "CLI_VALUES_INVALID");

        assert!(parse_optional_values_arg(None)
            .expect("missing should be empty")
            .is_empty());
    }

    #[test]
    fn session_helpers_cover_create_save_and_load_paths() {
        let schema = load_source_by_schema_file(&demo_schema_file("01-signup"))
            .expect("schema should load");
        let mut session =
            create_session_for_schema(&schema, Values::new(), None).expect("session should start");
        session
            .submit(values([("name", "Ann")]))
            .expect("submit should pass");

        let state_file = temp_path("session-ops-state.json");
        save_session_state(&state_file, &session).expect("state save should pass");

        let (loaded_schema, resumed) =
            load_session_from_state_for_ref(&state_file).expect("state ref load should pass");
        assert_eq!(loaded_schema.id, schema.id);
        assert_eq!(
            resumed.form().expect("form").default_of("nickname"),
            FlowValue::from("Ann")
        );

        let resumed = load_session_from_state_for_schema(&state_file, &schema)
            .expect("state schema load should pass");
        assert_eq!(resumed.state(), session.state());

        let boundary = boundary_from_session(&session).expect("boundary should resolve");
        let out = temp_path("session-ops-out.json");
        let code = emit_boundary_with_saved_state(&session, boundary, &out.to_string_lossy())
            .expect("emit with save should pass");
        assert_eq!(code, 0);
        assert!(out.exists());
    }

    #[test]
    fn load_session_from_state_for_schema_rejects_mismatch() {
        let schema = load_source_by_schema_file(&demo_schema_file("01-signup"))
            .expect("schema should load");
        let other = load_source_by_schema_file(&demo_schema_file("05-stale-defaults"))
            .expect("other should load");

        let session =
            create_session_for_schema(&other, Values::new(), None).expect("session should start");
        let state_file = temp_path("session-ops-mismatch.json");
        save_session_state(&state_file, &session).expect("state save should pass");

        let error = load_session_from_state_for_schema(&state_file, &schema)
            .expect_err("mismatch should fail");
        assert_eq!(error.code, "TUI_STATE_SCHEMA_MISMATCH");
    }
}

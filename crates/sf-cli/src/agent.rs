use std::path::Path;

use sf_api::FlowSession;
use sf_core::FlowError;

use crate::{
    boundary_from_session, boundary_from_step, create_session_for_schema,
    emit_boundary_with_saved_state, load_session_from_state_for_ref, load_source_by_schema_file,
    parse_optional_values_arg, parse_values_arg, AgentArgs, AgentCommand, BackArgs,
    BoundaryResult, NextArgs, StartArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, FlowError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Next(args) => run_next(args),
        AgentCommand::Back(args) => run_back(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, FlowError> {
    let schema = load_source_by_schema_file(&args.schema)?;
    let inputs = parse_optional_values_arg(args.inputs.as_deref())?;
    let session = create_session_for_schema(&schema, inputs, args.walk_guard)?;

    let boundary = boundary_from_session(&session)?;
    emit_boundary_with_saved_state(&session, boundary, &args.state_out)
}

pub(super) fn run_next(args: NextArgs) -> Result<i32, FlowError> {
    let values = parse_values_arg(&args.values)?;
    run_state_transition(&args.state_in, &args.state_out, |session| {
        Ok(boundary_from_step(session.submit(values)?))
    })
}

pub(super) fn run_back(args: BackArgs) -> Result<i32, FlowError> {
    let values = parse_optional_values_arg(args.values.as_deref())?;
    run_state_transition(&args.state_in, &args.state_out, |session| {
        session.back(values)?;
        boundary_from_session(session)
    })
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut FlowSession) -> Result<BoundaryResult, FlowError>,
) -> Result<i32, FlowError> {
    let (_, mut session) = load_session_from_state_for_ref(Path::new(state_in))?;
    let boundary = transition(&mut session)?;
    emit_boundary_with_saved_state(&session, boundary, state_out)
}

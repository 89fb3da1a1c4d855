use std::ffi::OsString;

use clap::Parser;
use sf_core::FlowError;

mod agent;
mod boundary_runner;
mod cli_args;
mod error_map;
mod line_tui;
mod models;
mod session_ops;
mod source_loader;
mod state_store;

pub(crate) use boundary_runner::{boundary_from_session, boundary_from_step, emit_boundary};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, BackArgs, Cli, LineArgs, Mode, NextArgs, StartArgs,
};
pub(crate) use error_map::{
    emit_error, map_cli_source_path, map_cli_source_read, map_cli_state_read,
    map_cli_state_write, map_cli_values_invalid, map_tui_io,
};
pub(crate) use line_tui::run_line_mode;
pub(crate) use models::{
    BoundaryEvent, BoundaryResult, LoadedSchema, TuiCommandAction, TuiCommandContext,
};
pub(crate) use session_ops::{
    create_session_for_schema, emit_boundary_with_saved_state, load_session_from_state_for_ref,
    load_session_from_state_for_schema, parse_optional_values_arg, parse_values_arg,
    save_session_state, save_session_state_with,
};
pub(crate) use source_loader::{load_source_by_ref, load_source_by_schema_file};
pub(crate) use state_store::{load_flow_state, save_flow_state};

const DEFAULT_STATE_FILE: &str = ".stepflow/save.json";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, FlowError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Line(args) => run_line(args),
    }
}

fn run_line(args: LineArgs) -> Result<i32, FlowError> {
    let state_file = args
        .state_file
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
    let schema = load_source_by_schema_file(&args.schema)?;
    let inputs = parse_optional_values_arg(args.inputs.as_deref())?;
    let mut session = create_session_for_schema(&schema, inputs.clone(), None)?;

    let context = TuiCommandContext {
        state_file: &state_file,
        schema: &schema,
        inputs: &inputs,
    };
    run_line_mode(&context, &mut session)
}

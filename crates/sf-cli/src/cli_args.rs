use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "stepflow")]
#[command(about = "StepFlow form-flow CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Line(LineArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Next(NextArgs),
    Back(BackArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "schema")]
    pub(crate) schema: String,
    /// Initial context as a JSON object.
    #[arg(long = "inputs")]
    pub(crate) inputs: Option<String>,
    #[arg(long = "walk-guard")]
    pub(crate) walk_guard: Option<usize>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct NextArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    /// Submitted field values as a JSON object.
    #[arg(long = "values")]
    pub(crate) values: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct BackArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    /// Values to keep for the form being left.
    #[arg(long = "values")]
    pub(crate) values: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct LineArgs {
    #[arg(long = "schema")]
    pub(crate) schema: String,
    #[arg(long = "inputs")]
    pub(crate) inputs: Option<String>,
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
}

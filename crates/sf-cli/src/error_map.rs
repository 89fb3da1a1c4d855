use sf_core::FlowError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> FlowError {
    FlowError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: FlowError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    1
}

pub(crate) fn map_tui_io(error: std::io::Error) -> FlowError {
    map_error("TUI_IO", error)
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> FlowError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> FlowError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_state_write(error: std::io::Error) -> FlowError {
    map_error("CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> FlowError {
    map_error("CLI_STATE_READ", error)
}

pub(crate) fn map_cli_values_invalid(error: serde_json::Error) -> FlowError {
    map_error("CLI_VALUES_INVALID", error)
}

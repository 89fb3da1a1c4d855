use std::fs;
use std::path::Path;

use sf_api::StateEnvelope;
use sf_core::FlowError;
use tracing::debug;

use crate::{map_cli_state_read, map_cli_state_write};

pub(crate) fn save_flow_state(path: &Path, envelope: &StateEnvelope) -> Result<(), FlowError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(map_cli_state_write)?;

    let payload = envelope.to_json()?;
    fs::write(path, payload).map_err(map_cli_state_write)?;
    debug!(path = %path.display(), depth = envelope.state.depth(), "state saved");
    Ok(())
}

pub(crate) fn load_flow_state(path: &Path) -> Result<StateEnvelope, FlowError> {
    if !path.exists() {
        return Err(FlowError::new(
            "CLI_STATE_NOT_FOUND",
            format!("State file does not exist: {}", path.display()),
        ));
    }

    let raw = fs::read_to_string(path).map_err(map_cli_state_read)?;
    StateEnvelope::from_json(&raw)
}

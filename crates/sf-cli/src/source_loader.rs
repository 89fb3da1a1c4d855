use std::fs;
use std::path::{Path, PathBuf};

use sf_core::FlowError;

use crate::{map_cli_source_path, map_cli_source_read, LoadedSchema};

const SCHEMA_FILE_PREFIX: &str = "schema-file:";

pub(crate) fn load_source_by_schema_file(schema_file: &str) -> Result<LoadedSchema, FlowError> {
    let path = resolve_schema_file(schema_file)?;
    let schema_json = fs::read_to_string(&path).map_err(map_cli_source_read)?;
    let title = path
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("flow")
        .to_string();

    Ok(LoadedSchema {
        id: make_schema_file_id(&path),
        title,
        schema_json,
    })
}

pub(crate) fn load_source_by_ref(schema_ref: &str) -> Result<LoadedSchema, FlowError> {
    let Some(raw) = schema_ref.strip_prefix(SCHEMA_FILE_PREFIX) else {
        return Err(FlowError::new(
            "CLI_SOURCE_REF_INVALID",
            format!("Unsupported schema ref: {}", schema_ref),
        ));
    };
    load_source_by_schema_file(raw)
}

pub(crate) fn resolve_schema_file(schema_file: &str) -> Result<PathBuf, FlowError> {
    let path = PathBuf::from(schema_file);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(FlowError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("schema file does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_file() {
        return Err(FlowError::new(
            "CLI_SOURCE_NOT_FILE",
            format!("schema path is not a file: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

pub(crate) fn make_schema_file_id(schema_file: &Path) -> String {
    format!("{}{}", SCHEMA_FILE_PREFIX, schema_file.display())
}

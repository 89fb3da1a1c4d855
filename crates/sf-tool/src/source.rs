use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{SfToolError, TestCase, TESTCASE_SCHEMA_V1};

const TESTCASE_FILE: &str = "testcase.json";

/// Every `testcase.json` under `root`, sorted by path.
pub fn discover_cases(root: &Path) -> Result<Vec<PathBuf>, SfToolError> {
    let mut cases = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == TESTCASE_FILE)
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();
    cases.sort();

    if cases.is_empty() {
        return Err(SfToolError::CasesEmpty {
            path: root.to_path_buf(),
        });
    }
    Ok(cases)
}

pub fn read_schema_json(example_dir: &Path, schema_file: &str) -> Result<String, SfToolError> {
    let path = example_dir.join(schema_file);
    fs::read_to_string(&path).map_err(|source| SfToolError::ReadFile { path, source })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, SfToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| SfToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| SfToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(SfToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

use serde::{Deserialize, Serialize};
use sf_core::{FlowValue, Values};

pub const TESTCASE_SCHEMA_V1: &str = "sf-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default = "default_schema_file")]
    pub schema_file: String,
    #[serde(default)]
    pub inputs: Values,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

fn default_schema_file() -> String {
    "flow.json".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Next {
        #[serde(default)]
        values: Values,
    },
    Back {
        #[serde(default)]
        values: Values,
    },
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Next { .. } => "next",
            Self::Back { .. } => "back",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectedEvent {
    /// A form became current; `path` is in `format_path` notation.
    Form {
        path: String,
        #[serde(default)]
        defaults: Values,
    },
    Emit {
        value: FlowValue,
    },
    Return {
        value: FlowValue,
    },
}

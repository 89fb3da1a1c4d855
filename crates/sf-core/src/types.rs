use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entries::Entries;
use crate::error::{FlowError, FLOW_INVALID_STATE};
use crate::value::Values;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Then,
    Else,
}

impl Branch {
    pub fn from_condition(condition: bool) -> Self {
        if condition {
            Self::Then
        } else {
            Self::Else
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Then => "then",
            Self::Else => "else",
        }
    }
}

/// Which arm of a switch a position points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchBranch {
    Case(usize),
    Default,
}

impl fmt::Display for SwitchBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Case(index) => write!(f, "case{}", index),
            Self::Default => f.write_str("default"),
        }
    }
}

/// Locates one child among the siblings of an enclosing construct. The variant
/// names the construct that owns the sibling list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Position {
    List { slot: usize },
    Cond { branch: Branch, slot: usize },
    Loop { slot: usize },
    Switch { branch: SwitchBranch, slot: usize },
}

impl Position {
    pub fn slot(&self) -> usize {
        match self {
            Self::List { slot }
            | Self::Cond { slot, .. }
            | Self::Loop { slot }
            | Self::Switch { slot, .. } => *slot,
        }
    }

    /// The same kind of position one slot further along.
    pub fn advanced(&self) -> Self {
        match *self {
            Self::List { slot } => Self::List { slot: slot + 1 },
            Self::Cond { branch, slot } => Self::Cond {
                branch,
                slot: slot + 1,
            },
            Self::Loop { slot } => Self::Loop { slot: slot + 1 },
            Self::Switch { branch, slot } => Self::Switch {
                branch,
                slot: slot + 1,
            },
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List { slot } => write!(f, "{}", slot),
            Self::Cond { branch, slot } => write!(f, "{}:{}", branch.as_str(), slot),
            Self::Loop { slot } => write!(f, "loop:{}", slot),
            Self::Switch { branch, slot } => write!(f, "{}:{}", branch, slot),
        }
    }
}

/// Positions from the schema root down to one node.
pub type Path = Vec<Position>;

pub fn format_path(path: &[Position]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

/// A visited form together with the context it was reached with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub path: Path,
    pub values: Values,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowState {
    pub cursors: Vec<Cursor>,
    #[serde(default)]
    pub entries: Entries,
}

impl FlowState {
    pub fn new(first: Cursor) -> Self {
        Self {
            cursors: vec![first],
            entries: Entries::default(),
        }
    }

    pub fn current(&self) -> Result<&Cursor, FlowError> {
        self.cursors.last().ok_or_else(|| {
            FlowError::new(FLOW_INVALID_STATE, "Flow state has an empty cursor trail.")
        })
    }

    pub fn depth(&self) -> usize {
        self.cursors.len()
    }
}

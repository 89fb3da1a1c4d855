pub mod entries;
pub mod error;
pub mod types;
pub mod value;

pub use entries::{Entries, EntryNode, FieldEntry};
pub use error::{
    FlowError, FLOW_INVALID_PATH, FLOW_INVALID_SCHEMA, FLOW_INVALID_STATE,
};
pub use types::*;
pub use value::*;

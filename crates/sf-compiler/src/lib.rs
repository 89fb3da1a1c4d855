mod expr;
mod json;
mod resolve;
mod schema;

pub use expr::{render_text, Expr, SCHEMA_COMPILE};
pub use json::{compile_schema_from_json, SCHEMA_PARSE};
pub use resolve::{descend, sibling};
pub use schema::{
    CondSchema, FieldSpec, FlowSchema, FormSchema, LoopSchema, Schema, SwitchSchema,
};

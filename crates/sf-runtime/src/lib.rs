mod callbacks;
mod engine;

pub use callbacks::{CollectingCallbacks, FlowCallbacks, NoopCallbacks};
pub use engine::{FieldView, FlowEngine, FlowEngineOptions, FormView, DEFAULT_WALK_GUARD};

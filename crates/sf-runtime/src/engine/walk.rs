use sf_compiler::{descend, sibling, FlowSchema, Schema};
use sf_core::{format_path, FlowError, FlowValue, Path, Values};
use tracing::{debug, trace, warn};

use super::context::merge;
use crate::callbacks::FlowCallbacks;

/// Where the walker goes next.
#[derive(Debug, Clone)]
pub(super) enum Move {
    /// Visit the node at this path.
    Enter(Path),
    /// The node at this path is finished; continue after it.
    Next(Path),
}

/// Where a walk came to rest.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Stop {
    Form { path: Path, context: Values },
    Return { path: Path, value: FlowValue },
}

pub(super) struct Walker<'a> {
    pub schema: &'a FlowSchema,
    pub guard: usize,
    pub callbacks: &'a mut dyn FlowCallbacks,
}

impl Walker<'_> {
    /// Runs moves until a form or a return is reached. Variables merge into the
    /// context and emits fire as they are crossed.
    pub fn run(&mut self, start: Move, mut context: Values) -> Result<Stop, FlowError> {
        let schema = self.schema;
        let mut next = start;
        let mut moves = 0usize;
        loop {
            moves += 1;
            if moves > self.guard {
                warn!(guard = self.guard, "flow walk exceeded its move guard");
                return Err(FlowError::invalid_schema(format!(
                    "Flow walk exceeded {} moves; a loop predicate probably never turns false.",
                    self.guard
                )));
            }

            next = match next {
                Move::Enter(path) => {
                    trace!(path = %format_path(&path), "enter");
                    let node = schema.find(&path)?;
                    match node {
                        Schema::Form(_) => {
                            debug!(path = %format_path(&path), moves, "walk stopped at form");
                            return Ok(Stop::Form { path, context });
                        }
                        Schema::Return(expr) => {
                            let value = expr.eval(&context)?;
                            debug!(path = %format_path(&path), moves, "walk reached return");
                            return Ok(Stop::Return { path, value });
                        }
                        Schema::Emit(expr) => {
                            let value = expr.eval(&context)?;
                            self.callbacks.on_emit(&value)?;
                            Move::Next(path)
                        }
                        Schema::Variables(expr) => {
                            context = merge(&context, expr.eval_values(&context)?);
                            Move::Next(path)
                        }
                        Schema::List(_)
                        | Schema::Cond(_)
                        | Schema::Loop(_)
                        | Schema::Switch(_) => {
                            match descend(node, &context)? {
                                Some(position) => {
                                    let mut inner = path;
                                    inner.push(position);
                                    Move::Enter(inner)
                                }
                                None => Move::Next(path),
                            }
                        }
                    }
                }
                Move::Next(path) => {
                    trace!(path = %format_path(&path), "next");
                    self.after(path)?
                }
            };
        }
    }

    /// The move that follows a finished node: its next sibling, or its container
    /// once the sibling list runs out. A finished loop body re-enters the loop so
    /// the predicate is checked against the context the pass left behind.
    fn after(&self, mut path: Path) -> Result<Move, FlowError> {
        let Some(last) = path.pop() else {
            return Err(FlowError::invalid_schema(
                "Flow ran past the end of the schema without reaching a form or a return.",
            ));
        };
        let container = self.schema.find(&path)?;
        if let Some(position) = sibling(container, &last) {
            path.push(position);
            return Ok(Move::Enter(path));
        }
        match container {
            Schema::Loop(_) => Ok(Move::Enter(path)),
            _ => Ok(Move::Next(path)),
        }
    }
}

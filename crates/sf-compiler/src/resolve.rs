use sf_core::{Branch, FlowError, Position, Values};

use crate::schema::{FlowSchema, Schema};

impl FlowSchema {
    /// Resolves `path` from the root list to the node it names.
    pub fn find(&self, path: &[Position]) -> Result<&Schema, FlowError> {
        let mut node = self.root();
        for position in path {
            node = node
                .child(position)
                .ok_or_else(|| FlowError::invalid_path(path))?;
        }
        Ok(node)
    }

    /// The node that owns the sibling list `path` points into. The root list
    /// contains every top-level position.
    pub fn container(&self, path: &[Position]) -> Result<&Schema, FlowError> {
        match path.split_last() {
            Some((_, parent)) => self.find(parent),
            None => Err(FlowError::invalid_path(path)),
        }
    }
}

/// The first position reached by entering `node`, or `None` when entering yields
/// nothing (an empty list or branch, or a loop whose predicate is false).
/// A switch enters its first case whose predicate holds, else its default.
/// Leaf nodes have no positions of their own.
pub fn descend(node: &Schema, context: &Values) -> Result<Option<Position>, FlowError> {
    match node {
        Schema::List(items) => Ok((!items.is_empty()).then_some(Position::List { slot: 0 })),
        Schema::Cond(cond) => {
            let branch = Branch::from_condition(cond.when.eval_bool(context)?);
            Ok((!cond.branch(branch).is_empty()).then_some(Position::Cond { branch, slot: 0 }))
        }
        Schema::Loop(repeat) => {
            if repeat.body.is_empty() || !repeat.when.eval_bool(context)? {
                return Ok(None);
            }
            Ok(Some(Position::Loop { slot: 0 }))
        }
        Schema::Switch(switch) => {
            let branch = switch.choose(context)?;
            let entered = switch.branch(branch).is_some_and(|body| !body.is_empty());
            Ok(entered.then_some(Position::Switch { branch, slot: 0 }))
        }
        _ => Ok(None),
    }
}

/// The next position in the same sibling list as `position`, if there is one.
pub fn sibling(container: &Schema, position: &Position) -> Option<Position> {
    let next = position.advanced();
    container.child(&next).map(|_| next)
}

mod context;
mod form;
mod walk;

use std::sync::Arc;

use sf_compiler::{FlowSchema, FormSchema, Schema};
use sf_core::{
    format_path, Cursor, Entries, FlowError, FlowState, Position, Values, FLOW_INVALID_PATH,
    FLOW_INVALID_SCHEMA,
};
use tracing::debug;

use crate::callbacks::FlowCallbacks;
use context::merge;
use walk::{Move, Stop, Walker};

pub use form::{FieldView, FormView};

pub const DEFAULT_WALK_GUARD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowEngineOptions {
    /// Upper bound on walker moves per operation.
    pub walk_guard: usize,
}

impl Default for FlowEngineOptions {
    fn default() -> Self {
        Self {
            walk_guard: DEFAULT_WALK_GUARD,
        }
    }
}

/// Navigates flow states over one compiled schema. The engine holds no per-flow
/// state: every operation takes a `FlowState` and returns a new one.
#[derive(Debug, Clone)]
pub struct FlowEngine {
    schema: Arc<FlowSchema>,
    options: FlowEngineOptions,
}

impl FlowEngine {
    pub fn new(schema: impl Into<Arc<FlowSchema>>) -> Self {
        Self::with_options(schema, FlowEngineOptions::default())
    }

    pub fn with_options(schema: impl Into<Arc<FlowSchema>>, options: FlowEngineOptions) -> Self {
        Self {
            schema: schema.into(),
            options,
        }
    }

    pub fn schema(&self) -> &FlowSchema {
        &self.schema
    }

    pub fn options(&self) -> FlowEngineOptions {
        self.options
    }

    /// Walks from the start of the schema to the first form.
    pub fn initialize(
        &self,
        inputs: Values,
        callbacks: &mut dyn FlowCallbacks,
    ) -> Result<FlowState, FlowError> {
        match self.walk(Move::Enter(Vec::new()), inputs, callbacks)? {
            Stop::Form { path, context } => {
                debug!(path = %format_path(&path), "flow initialized");
                Ok(FlowState::new(Cursor {
                    path,
                    values: context,
                }))
            }
            Stop::Return { path, .. } => Err(FlowError::with_path(
                FLOW_INVALID_SCHEMA,
                "Flow reached a return before any form.",
                &path,
            )),
        }
    }

    /// Submits the current form and walks on to the next form or return.
    ///
    /// On a return the trail is left as it was; the entries still record the
    /// submission.
    pub fn advance(
        &self,
        state: &FlowState,
        submitted: Values,
        callbacks: &mut dyn FlowCallbacks,
    ) -> Result<FlowState, FlowError> {
        let cursor = state.current()?;
        let entries = self.record_entries(&state.entries, cursor, &submitted)?;
        let context = merge(&cursor.values, submitted);

        match self.walk(Move::Next(cursor.path.clone()), context, callbacks)? {
            Stop::Form { path, context } => {
                let mut cursors = state.cursors.clone();
                cursors.push(Cursor {
                    path,
                    values: context,
                });
                Ok(FlowState { cursors, entries })
            }
            Stop::Return { path, value } => {
                callbacks.on_return(&value)?;
                debug!(path = %format_path(&path), "flow returned");
                Ok(FlowState {
                    cursors: state.cursors.clone(),
                    entries,
                })
            }
        }
    }

    /// Keeps `values` as the current form's entries and steps back one form.
    /// At the first form only the entries change.
    pub fn rewind(&self, state: &FlowState, values: Values) -> Result<FlowState, FlowError> {
        let cursor = state.current()?;
        let entries = self.record_entries(&state.entries, cursor, &values)?;
        let mut cursors = state.cursors.clone();
        if cursors.len() > 1 {
            cursors.pop();
        }
        Ok(FlowState { cursors, entries })
    }

    /// Records `values` as the current form's entries without moving along the trail.
    pub fn record(&self, state: &FlowState, values: Values) -> Result<FlowState, FlowError> {
        let cursor = state.current()?;
        let entries = self.record_entries(&state.entries, cursor, &values)?;
        Ok(FlowState {
            cursors: state.cursors.clone(),
            entries,
        })
    }

    /// Resolves the defaults the current form should display.
    pub fn current_form(&self, state: &FlowState) -> Result<FormView, FlowError> {
        let cursor = state.current()?;
        let form = self.form_at(&cursor.path)?;
        let fields = form
            .fields(&cursor.values)?
            .into_iter()
            .map(|field| {
                let stored = state.entries.get(&cursor.path, &field.name);
                let reused = stored.is_fresh(&field.keys);
                FieldView {
                    default: if reused { stored.value } else { field.default },
                    name: field.name,
                    keys: field.keys,
                    reused,
                }
            })
            .collect();
        Ok(FormView {
            path: cursor.path.clone(),
            fields,
            render: form.render.clone(),
            values: cursor.values.clone(),
        })
    }

    fn walk(
        &self,
        start: Move,
        context: Values,
        callbacks: &mut dyn FlowCallbacks,
    ) -> Result<Stop, FlowError> {
        Walker {
            schema: &self.schema,
            guard: self.options.walk_guard,
            callbacks,
        }
        .run(start, context)
    }

    fn form_at(&self, path: &[Position]) -> Result<&FormSchema, FlowError> {
        match self.schema.find(path)? {
            Schema::Form(form) => Ok(form),
            other => Err(FlowError::with_path(
                FLOW_INVALID_PATH,
                format!(
                    "Path \"{}\" points at a {} step, not a form.",
                    format_path(path),
                    other.kind_name()
                ),
                path,
            )),
        }
    }

    /// Writes each submitted field at the cursor's form, keyed by the dependency
    /// values its default was computed from before the submission.
    fn record_entries(
        &self,
        entries: &Entries,
        cursor: &Cursor,
        submitted: &Values,
    ) -> Result<Entries, FlowError> {
        let form = self.form_at(&cursor.path)?;
        if submitted.is_empty() {
            return Ok(entries.clone());
        }
        let fields = form.fields(&cursor.values)?;
        let mut updated = entries.clone();
        for (name, value) in submitted {
            let keys = fields
                .iter()
                .find(|field| &field.name == name)
                .map(|field| field.keys.clone())
                .unwrap_or_default();
            updated = updated.set(&cursor.path, name, keys, value.clone());
        }
        Ok(updated)
    }
}

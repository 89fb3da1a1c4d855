use std::path::Path;

use sf_api::{create_session_from_json, CreateSessionFromJsonOptions, StepOutcome};
use sf_core::{format_path, FlowValue};
use sf_runtime::FormView;

use crate::source::{read_schema_json, read_test_case};
use crate::{ExpectedEvent, SfToolError, TestAction, TestCase};

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub returned: Option<FlowValue>,
}

fn form_event(view: &FormView) -> ExpectedEvent {
    ExpectedEvent::Form {
        path: format_path(&view.path),
        defaults: view.defaults(),
    }
}

fn emit_events(observed: &mut Vec<ExpectedEvent>, emitted: &[FlowValue]) {
    observed.extend(
        emitted
            .iter()
            .map(|value| ExpectedEvent::Emit {
                value: value.clone(),
            }),
    );
}

/// Starts the case's flow and plays its actions, recording every form, emit and
/// return along the way.
pub fn run_case(example_dir: &Path, case: &TestCase) -> Result<RunReport, SfToolError> {
    let schema_json = read_schema_json(example_dir, &case.schema_file)?;
    let mut session = create_session_from_json(CreateSessionFromJsonOptions {
        schema_json,
        schema_ref: example_dir.join(&case.schema_file).display().to_string(),
        inputs: case.inputs.clone(),
        walk_guard: None,
    })?;

    let mut observed_events = Vec::new();
    emit_events(&mut observed_events, session.emitted());
    observed_events.push(form_event(&session.form()?));

    for (action_index, action) in case.actions.iter().enumerate() {
        match action {
            TestAction::Next { values } => {
                if session.is_finished() {
                    return Err(SfToolError::ActionAfterReturn {
                        action_index,
                        action_kind: action.kind_name().to_string(),
                    });
                }
                let step = session.submit(values.clone())?;
                emit_events(&mut observed_events, &step.emitted);
                match step.outcome {
                    StepOutcome::Form(view) => observed_events.push(form_event(&view)),
                    StepOutcome::Returned(value) => {
                        observed_events.push(ExpectedEvent::Return { value })
                    }
                }
            }
            TestAction::Back { values } => {
                let view = session.back(values.clone())?;
                observed_events.push(form_event(&view));
            }
        }
    }

    Ok(RunReport {
        observed_events,
        consumed_actions: case.actions.len(),
        returned: session.returned().cloned(),
    })
}

pub fn assert_case(example_dir: &Path, case_path: &Path) -> Result<(), SfToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(example_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(SfToolError::EventSerialize)?;
        return Err(SfToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(SfToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(SfToolError::EventSerialize)?;
            return Err(SfToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}

use std::io::{self, BufRead, Write};
use std::path::Path;

use sf_api::FlowSession;
use sf_compiler::render_text;
use sf_core::{format_path, FlowError, FlowValue, Values};
use sf_runtime::FormView;

use crate::{
    boundary_from_session, boundary_from_step, create_session_for_schema,
    load_session_from_state_for_schema, map_tui_io, save_session_state_with, BoundaryResult,
    TuiCommandAction, TuiCommandContext,
};

const HELP: &str = "commands: :help :back :save :load :restart :quit (enter name=value, empty line submits)";

pub(crate) fn run_line_mode(
    context: &TuiCommandContext<'_>,
    session: &mut FlowSession,
) -> Result<i32, FlowError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_line_mode_with_io(context, session, &mut reader, &mut writer)
}

pub(crate) fn run_line_mode_with_io(
    context: &TuiCommandContext<'_>,
    session: &mut FlowSession,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, FlowError> {
    writeln!(writer, "StepFlow {}", context.schema.title).map_err(map_tui_io)?;
    writeln!(writer, "{}", HELP).map_err(map_tui_io)?;

    let mut boundary = boundary_from_session(session)?;
    loop {
        write_boundary(&boundary, writer)?;
        let Some(form) = boundary.form.clone() else {
            return Ok(0);
        };

        let mut pending = Values::new();
        boundary = loop {
            let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                return Ok(0);
            };
            let raw = raw.trim();

            let mut lines = Vec::new();
            let mut emit = |line: String| lines.push(line);
            let action = handle_tui_command(raw, context, session, &mut pending, &mut emit)?;
            for line in lines {
                writeln!(writer, "{}", line).map_err(map_tui_io)?;
            }
            match action {
                TuiCommandAction::Continue => continue,
                TuiCommandAction::RefreshBoundary => break boundary_from_session(session)?,
                TuiCommandAction::Quit => return Ok(0),
                TuiCommandAction::NotHandled => {}
            }

            if raw.is_empty() {
                let mut submission = form.defaults();
                submission.append(&mut pending);
                break boundary_from_step(session.submit(submission)?);
            }

            match parse_field_assignment(raw) {
                Some((name, value)) => {
                    pending.insert(name, value);
                }
                None => writeln!(writer, "expected name=value or a command; :help lists them")
                    .map_err(map_tui_io)?,
            }
        };
    }
}

pub(crate) fn handle_tui_command(
    raw: &str,
    context: &TuiCommandContext<'_>,
    session: &mut FlowSession,
    pending: &mut Values,
    emit: &mut dyn FnMut(String),
) -> Result<TuiCommandAction, FlowError> {
    match raw {
        ":help" => {
            emit(HELP.to_string());
            Ok(TuiCommandAction::Continue)
        }
        ":back" => {
            session.back(std::mem::take(pending))?;
            emit("back".to_string());
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":save" => {
            save_session_state_with(Path::new(context.state_file), session, pending.clone())?;
            emit(format!("saved: {}", context.state_file));
            Ok(TuiCommandAction::Continue)
        }
        ":load" => {
            *session =
                load_session_from_state_for_schema(Path::new(context.state_file), context.schema)?;
            pending.clear();
            emit(format!("loaded: {}", context.state_file));
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":restart" => {
            *session = create_session_for_schema(
                context.schema,
                context.inputs.clone(),
                Some(session.engine().options().walk_guard),
            )?;
            pending.clear();
            emit("restarted".to_string());
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":quit" => {
            emit("bye".to_string());
            Ok(TuiCommandAction::Quit)
        }
        _ if raw.starts_with(':') => {
            emit(format!("unknown command: {}", raw));
            Ok(TuiCommandAction::Continue)
        }
        _ => Ok(TuiCommandAction::NotHandled),
    }
}

/// `name=json`; a value that is not JSON is taken as a plain string.
pub(crate) fn parse_field_assignment(raw: &str) -> Option<(String, FlowValue)> {
    let (name, value) = raw.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim();
    let parsed = serde_json::from_str::<FlowValue>(value)
        .unwrap_or_else(|_| FlowValue::String(value.to_string()));
    Some((name.to_string(), parsed))
}

fn write_boundary(boundary: &BoundaryResult, writer: &mut dyn Write) -> Result<(), FlowError> {
    for value in &boundary.emitted {
        writeln!(writer, "emit: {}", value).map_err(map_tui_io)?;
    }
    if let Some(form) = &boundary.form {
        for line in form_lines(form)? {
            writeln!(writer, "{}", line).map_err(map_tui_io)?;
        }
    }
    if let Some(value) = &boundary.returned {
        writeln!(writer).map_err(map_tui_io)?;
        writeln!(writer, "[RETURN] {}", value).map_err(map_tui_io)?;
    }
    Ok(())
}

/// Title and field listing for one form, with `${..}` placeholders filled from its context.
pub(crate) fn form_lines(form: &FormView) -> Result<Vec<String>, FlowError> {
    let render = form.render.as_map();
    let title = render
        .and_then(|render| render.get("title"))
        .and_then(FlowValue::as_string);
    let labels = render
        .and_then(|render| render.get("fields"))
        .and_then(FlowValue::as_map);

    let mut lines = vec![String::new()];
    match title {
        Some(title) => lines.push(render_text(title, &form.values)?),
        None => lines.push(format!("[form {}]", format_path(&form.path))),
    }
    for field in &form.fields {
        let label = labels
            .and_then(|labels| labels.get(&field.name))
            .and_then(FlowValue::as_string);
        let default = serde_json::to_string(&field.default).map_err(|error| {
            FlowError::new("TUI_RENDER", format!("Field default cannot be shown: {}", error))
        })?;
        match label {
            Some(label) => lines.push(format!("  {} ({}) = {}", field.name, label, default)),
            None => lines.push(format!("  {} = {}", field.name, default)),
        }
    }
    Ok(lines)
}

/// Reads one line; `None` once input is exhausted.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, FlowError> {
    write!(writer, "{}", prefix).map_err(map_tui_io)?;
    writer.flush().map_err(map_tui_io)?;
    let mut input = String::new();
    let read = reader.read_line(&mut input).map_err(map_tui_io)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

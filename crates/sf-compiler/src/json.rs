use serde::Deserialize;
use sf_core::{FlowError, FlowValue};

use crate::expr::{Expr, SCHEMA_COMPILE};
use crate::schema::{FlowSchema, Schema};

pub const SCHEMA_PARSE: &str = "SCHEMA_PARSE";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSchema {
    List(Vec<RawSchema>),
    Item(RawItem),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawItem {
    Form(RawForm),
    Cond(RawCond),
    Loop(RawLoop),
    Switch(RawSwitch),
    Variables(String),
    #[serde(alias = "emit")]
    Yield(String),
    Return(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawForm {
    values: String,
    #[serde(default)]
    render: FlowValue,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCond {
    #[serde(rename = "if")]
    when: String,
    #[serde(default)]
    then: Vec<RawSchema>,
    #[serde(default, rename = "else")]
    otherwise: Vec<RawSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLoop {
    #[serde(rename = "while")]
    when: String,
    #[serde(rename = "do")]
    body: Vec<RawSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSwitch {
    branches: Vec<RawCase>,
    #[serde(default)]
    default: Vec<RawSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCase {
    case: String,
    #[serde(default)]
    then: Vec<RawSchema>,
}

/// Parses a JSON schema document and compiles every expression in it.
/// The document is the top-level list of steps.
pub fn compile_schema_from_json(source: &str) -> Result<FlowSchema, FlowError> {
    let items: Vec<RawSchema> = serde_json::from_str(source).map_err(|error| {
        FlowError::new(
            SCHEMA_PARSE,
            format!("Schema JSON is invalid: {}", error),
        )
    })?;
    Ok(FlowSchema::new(compile_list(items, "root")?))
}

fn compile_list(items: Vec<RawSchema>, owner: &str) -> Result<Vec<Schema>, FlowError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| compile_node(item, &format!("{}[{}]", owner, index)))
        .collect()
}

fn compile_node(raw: RawSchema, at: &str) -> Result<Schema, FlowError> {
    let item = match raw {
        RawSchema::List(items) => {
            if items.is_empty() {
                return Err(FlowError::new(
                    SCHEMA_COMPILE,
                    format!("Nested list at {} is empty.", at),
                ));
            }
            return Ok(Schema::List(compile_list(items, at)?));
        }
        RawSchema::Item(item) => item,
    };

    let node = match item {
        RawItem::Form(form) => Schema::form(Expr::script(&form.values)?, form.render),
        RawItem::Cond(cond) => Schema::cond(
            Expr::script(&cond.when)?,
            compile_list(cond.then, &format!("{}.then", at))?,
            compile_list(cond.otherwise, &format!("{}.else", at))?,
        ),
        RawItem::Loop(repeat) => {
            if repeat.body.is_empty() {
                return Err(FlowError::new(
                    SCHEMA_COMPILE,
                    format!("Loop at {} has an empty body.", at),
                ));
            }
            Schema::repeat_while(
                Expr::script(&repeat.when)?,
                compile_list(repeat.body, &format!("{}.do", at))?,
            )
        }
        RawItem::Switch(switch) => {
            let branches = switch
                .branches
                .into_iter()
                .enumerate()
                .map(|(index, branch)| -> Result<(Expr, Vec<Schema>), FlowError> {
                    let body = compile_list(branch.then, &format!("{}.case{}", at, index))?;
                    Ok((Expr::script(&branch.case)?, body))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Schema::switch(
                branches,
                compile_list(switch.default, &format!("{}.default", at))?,
            )
        }
        RawItem::Variables(source) => Schema::Variables(Expr::script(&source)?),
        RawItem::Yield(source) => Schema::Emit(Expr::script(&source)?),
        RawItem::Return(source) => Schema::Return(Expr::script(&source)?),
    };
    Ok(node)
}

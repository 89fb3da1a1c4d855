use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use rhai::{Array, Dynamic, Engine, ImmutableString, Map, Scope, AST, FLOAT, INT};
use sf_core::{FlowError, FlowValue, Values};

pub const SCHEMA_COMPILE: &str = "SCHEMA_COMPILE";

const MAX_OPERATIONS: u64 = 100_000;

type NativeFn = dyn Fn(&Values) -> Result<FlowValue, FlowError> + Send + Sync;

/// A pure function of the accumulated context: either a compiled Rhai expression
/// or a host closure.
#[derive(Clone)]
pub enum Expr {
    Script { source: String, ast: Arc<AST> },
    Native(Arc<NativeFn>),
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script { source, .. } => f.debug_tuple("Script").field(source).finish(),
            Self::Native(_) => f.write_str("Native(..)"),
        }
    }
}

fn engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(|| {
        let mut engine = Engine::new();
        engine.set_max_operations(MAX_OPERATIONS);
        engine
    })
}

impl Expr {
    pub fn script(source: &str) -> Result<Self, FlowError> {
        let ast = engine().compile_expression(source).map_err(|error| {
            FlowError::new(
                SCHEMA_COMPILE,
                format!("Expression \"{}\" does not compile: {}", source, error),
            )
        })?;
        Ok(Self::Script {
            source: source.to_string(),
            ast: Arc::new(ast),
        })
    }

    pub fn native<F>(function: F) -> Self
    where
        F: Fn(&Values) -> Result<FlowValue, FlowError> + Send + Sync + 'static,
    {
        Self::Native(Arc::new(function))
    }

    pub fn constant(value: impl Into<FlowValue>) -> Self {
        let value = value.into();
        Self::native(move |_| Ok(value.clone()))
    }

    pub fn describe(&self) -> &str {
        match self {
            Self::Script { source, .. } => source,
            Self::Native(_) => "<native>",
        }
    }

    pub fn eval(&self, context: &Values) -> Result<FlowValue, FlowError> {
        match self {
            Self::Script { source, ast } => {
                let mut scope = scope_from_context(context)?;
                let result = engine()
                    .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
                    .map_err(|error| {
                        FlowError::invalid_schema(format!(
                            "Expression \"{}\" failed: {}",
                            source, error
                        ))
                    })?;
                dynamic_to_value(result)
            }
            Self::Native(function) => function(context),
        }
    }

    pub fn eval_bool(&self, context: &Values) -> Result<bool, FlowError> {
        match self.eval(context)? {
            FlowValue::Bool(value) => Ok(value),
            other => Err(FlowError::invalid_schema(format!(
                "Expression \"{}\" must evaluate to boolean, got {}.",
                self.describe(),
                other.type_name()
            ))),
        }
    }

    pub fn eval_values(&self, context: &Values) -> Result<Values, FlowError> {
        match self.eval(context)? {
            FlowValue::Map(values) => Ok(values),
            other => Err(FlowError::invalid_schema(format!(
                "Expression \"{}\" must evaluate to a map, got {}.",
                self.describe(),
                other.type_name()
            ))),
        }
    }
}

/// Replaces every `${expr}` placeholder with the expression's value in `context`.
pub fn render_text(template: &str, context: &Values) -> Result<String, FlowError> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let regex = PLACEHOLDER
        .get_or_init(|| Regex::new(r"\$\{([^{}]+)\}").expect("template regex must compile"));

    let mut output = String::new();
    let mut last_index = 0usize;
    for captures in regex.captures_iter(template) {
        let (Some(full), Some(expr)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        output.push_str(&template[last_index..full.start()]);
        let mut scope = scope_from_context(context)?;
        let value = engine()
            .eval_expression_with_scope::<Dynamic>(&mut scope, expr.as_str())
            .map_err(|error| {
                FlowError::invalid_schema(format!(
                    "Template placeholder \"{}\" failed: {}",
                    expr.as_str(),
                    error
                ))
            })?;
        output.push_str(&dynamic_to_value(value)?.to_string());
        last_index = full.end();
    }
    output.push_str(&template[last_index..]);
    Ok(output)
}

fn scope_from_context(context: &Values) -> Result<Scope<'static>, FlowError> {
    let mut scope = Scope::new();
    for (name, value) in context {
        scope.push_dynamic(name.clone(), value_to_dynamic(value)?);
    }
    Ok(scope)
}

fn value_to_dynamic(value: &FlowValue) -> Result<Dynamic, FlowError> {
    match value {
        FlowValue::Null => Ok(Dynamic::UNIT),
        FlowValue::Bool(value) => Ok(Dynamic::from_bool(*value)),
        // Integral numbers go in as INT so they can index arrays and strings.
        FlowValue::Number(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => {
            Ok(Dynamic::from_int(*value as INT))
        }
        FlowValue::Number(value) => Ok(Dynamic::from_float(*value as FLOAT)),
        FlowValue::String(value) => Ok(Dynamic::from(value.clone())),
        FlowValue::Array(values) => {
            let mut array = Array::new();
            for value in values {
                array.push(value_to_dynamic(value)?);
            }
            Ok(Dynamic::from_array(array))
        }
        FlowValue::Map(values) => {
            let mut map = Map::new();
            for (key, value) in values {
                map.insert(key.clone().into(), value_to_dynamic(value)?);
            }
            Ok(Dynamic::from_map(map))
        }
    }
}

fn dynamic_to_value(value: Dynamic) -> Result<FlowValue, FlowError> {
    if value.is_unit() {
        return Ok(FlowValue::Null);
    }
    if value.is::<bool>() {
        return Ok(FlowValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(FlowValue::Number(value.cast::<INT>() as f64));
    }
    if value.is::<FLOAT>() {
        return Ok(FlowValue::Number(value.cast::<FLOAT>()));
    }
    if value.is::<char>() {
        return Ok(FlowValue::String(value.cast::<char>().to_string()));
    }
    if value.is::<ImmutableString>() {
        return Ok(FlowValue::String(
            value.cast::<ImmutableString>().to_string(),
        ));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_value(item)?);
        }
        return Ok(FlowValue::Array(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.to_string(), dynamic_to_value(value)?);
        }
        return Ok(FlowValue::Map(out));
    }

    Err(FlowError::invalid_schema(format!(
        "Unsupported expression result type \"{}\".",
        value.type_name()
    )))
}

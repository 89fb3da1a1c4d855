use sf_core::{Branch, FlowError, FlowValue, Position, SwitchBranch, Values};

use crate::expr::Expr;

/// One node of a flow schema. Built once and never mutated afterwards.
#[derive(Debug, Clone)]
pub enum Schema {
    List(Vec<Schema>),
    Cond(CondSchema),
    Loop(LoopSchema),
    Switch(SwitchSchema),
    Form(FormSchema),
    Emit(Expr),
    Return(Expr),
    Variables(Expr),
}

#[derive(Debug, Clone)]
pub struct CondSchema {
    pub when: Expr,
    pub then: Vec<Schema>,
    pub otherwise: Vec<Schema>,
}

impl CondSchema {
    pub fn branch(&self, branch: Branch) -> &[Schema] {
        match branch {
            Branch::Then => &self.then,
            Branch::Else => &self.otherwise,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopSchema {
    pub when: Expr,
    pub body: Vec<Schema>,
}

/// Cases are tried in order; the first whose predicate holds is entered.
#[derive(Debug, Clone)]
pub struct SwitchSchema {
    pub branches: Vec<(Expr, Vec<Schema>)>,
    pub default: Vec<Schema>,
}

impl SwitchSchema {
    pub fn branch(&self, branch: SwitchBranch) -> Option<&[Schema]> {
        match branch {
            SwitchBranch::Case(index) => self.branches.get(index).map(|(_, body)| body.as_slice()),
            SwitchBranch::Default => Some(self.default.as_slice()),
        }
    }

    pub fn choose(&self, context: &Values) -> Result<SwitchBranch, FlowError> {
        for (index, (when, _)) in self.branches.iter().enumerate() {
            if when.eval_bool(context)? {
                return Ok(SwitchBranch::Case(index));
            }
        }
        Ok(SwitchBranch::Default)
    }
}

#[derive(Debug, Clone)]
pub struct FormSchema {
    /// Evaluates to `field -> [default, [dependency values]]`.
    pub values: Expr,
    /// Opaque to the engine; handed to whatever renders the form.
    pub render: FlowValue,
}

/// A form field's computed default and the values it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub default: FlowValue,
    pub keys: Vec<FlowValue>,
}

impl FormSchema {
    pub fn fields(&self, context: &Values) -> Result<Vec<FieldSpec>, FlowError> {
        let declared = self.values.eval_values(context)?;
        Ok(declared
            .into_iter()
            .map(|(name, declaration)| {
                let (default, keys) = split_declaration(declaration);
                FieldSpec {
                    name,
                    default,
                    keys,
                }
            })
            .collect())
    }
}

/// `[default, [keys..]]` is the full form; any other value is a bare default.
fn split_declaration(declaration: FlowValue) -> (FlowValue, Vec<FlowValue>) {
    match declaration {
        FlowValue::Array(mut pair)
            if pair.len() == 2 && matches!(pair[1], FlowValue::Array(_)) =>
        {
            let keys = match pair.pop() {
                Some(FlowValue::Array(keys)) => keys,
                _ => Vec::new(),
            };
            let default = pair.pop().unwrap_or_default();
            (default, keys)
        }
        other => (other, Vec::new()),
    }
}

impl Schema {
    pub fn form(values: Expr, render: impl Into<FlowValue>) -> Self {
        Self::Form(FormSchema {
            values,
            render: render.into(),
        })
    }

    pub fn cond(when: Expr, then: Vec<Schema>, otherwise: Vec<Schema>) -> Self {
        Self::Cond(CondSchema {
            when,
            then,
            otherwise,
        })
    }

    pub fn repeat_while(when: Expr, body: Vec<Schema>) -> Self {
        Self::Loop(LoopSchema { when, body })
    }

    pub fn switch(branches: Vec<(Expr, Vec<Schema>)>, default: Vec<Schema>) -> Self {
        Self::Switch(SwitchSchema { branches, default })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Cond(_) => "cond",
            Self::Loop(_) => "loop",
            Self::Switch(_) => "switch",
            Self::Form(_) => "form",
            Self::Emit(_) => "emit",
            Self::Return(_) => "return",
            Self::Variables(_) => "variables",
        }
    }

    /// Lists, conditionals, loops and switches own nested positions; everything else is a leaf step.
    pub fn is_flow(&self) -> bool {
        matches!(
            self,
            Self::List(_) | Self::Cond(_) | Self::Loop(_) | Self::Switch(_)
        )
    }

    pub fn child(&self, position: &Position) -> Option<&Schema> {
        match (self, position) {
            (Self::List(items), Position::List { slot }) => items.get(*slot),
            (Self::Cond(cond), Position::Cond { branch, slot }) => cond.branch(*branch).get(*slot),
            (Self::Loop(repeat), Position::Loop { slot }) => repeat.body.get(*slot),
            (Self::Switch(switch), Position::Switch { branch, slot }) => {
                switch.branch(*branch).and_then(|body| body.get(*slot))
            }
            _ => None,
        }
    }
}

/// A complete schema. The root is always a list.
#[derive(Debug, Clone)]
pub struct FlowSchema {
    root: Schema,
}

impl FlowSchema {
    pub fn new(items: Vec<Schema>) -> Self {
        Self {
            root: Schema::List(items),
        }
    }

    pub fn root(&self) -> &Schema {
        &self.root
    }
}

use sf_core::{FlowValue, Path, Values};

/// One field as the current form should display it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub name: String,
    pub default: FlowValue,
    pub keys: Vec<FlowValue>,
    /// The default is a stored entry rather than the form's computed default.
    pub reused: bool,
}

/// Everything a renderer needs for the current form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub path: Path,
    pub fields: Vec<FieldView>,
    pub render: FlowValue,
    pub values: Values,
}

impl FormView {
    /// Field defaults as a submission-shaped map.
    pub fn defaults(&self) -> Values {
        self.fields
            .iter()
            .map(|field| (field.name.clone(), field.default.clone()))
            .collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn default_of(&self, name: &str) -> FlowValue {
        self.field(name)
            .map(|field| field.default.clone())
            .unwrap_or_default()
    }
}

//! Previously submitted field values, stored in a tree shaped like the schema.
//!
//! The tree is persistent: `set` rebuilds only the nodes along the written path and
//! shares every other subtree with the previous version through `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::types::{Branch, Position, SwitchBranch};
use crate::value::FlowValue;

/// What a form field looked like when it was last submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub present: bool,
    #[serde(default)]
    pub value: FlowValue,
    /// Values the field's default depended on at submission time.
    #[serde(default)]
    pub keys: Vec<FlowValue>,
}

impl FieldEntry {
    pub fn absent() -> Self {
        Self {
            present: false,
            value: FlowValue::Null,
            keys: Vec::new(),
        }
    }

    /// A stored value is reusable only while its dependencies are unchanged.
    pub fn is_fresh(&self, keys: &[FlowValue]) -> bool {
        self.present && self.keys.as_slice() == keys
    }
}

type Slots = BTreeMap<usize, Arc<EntryNode>>;

// Tagged nodes are buffered before they are decoded, which hands numeric map keys
// over as strings. Slot keys are parsed back by hand.
fn parse_slot_keys<V, E: de::Error>(raw: BTreeMap<String, V>) -> Result<BTreeMap<usize, V>, E> {
    raw.into_iter()
        .map(|(key, value)| {
            key.parse::<usize>()
                .map(|slot| (slot, value))
                .map_err(|_| E::custom(format!("invalid slot key `{}`", key)))
        })
        .collect()
}

fn slots_from_keys<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Slots, D::Error> {
    parse_slot_keys(BTreeMap::<String, Arc<EntryNode>>::deserialize(deserializer)?)
}

#[derive(Deserialize)]
#[serde(transparent)]
struct KeyedSlots(#[serde(deserialize_with = "slots_from_keys")] Slots);

fn cases_from_keys<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<usize, Slots>, D::Error> {
    let raw = BTreeMap::<String, KeyedSlots>::deserialize(deserializer)?;
    let cases = parse_slot_keys::<_, D::Error>(raw)?;
    Ok(cases
        .into_iter()
        .map(|(index, KeyedSlots(slots))| (index, slots))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryNode {
    List {
        #[serde(default, deserialize_with = "slots_from_keys")]
        list: Slots,
    },
    Cond {
        #[serde(default, deserialize_with = "slots_from_keys")]
        then: Slots,
        #[serde(default, rename = "else", deserialize_with = "slots_from_keys")]
        otherwise: Slots,
    },
    Loop {
        #[serde(default, deserialize_with = "slots_from_keys")]
        list: Slots,
    },
    Switch {
        #[serde(default, deserialize_with = "cases_from_keys")]
        cases: BTreeMap<usize, Slots>,
        #[serde(default, deserialize_with = "slots_from_keys")]
        default: Slots,
    },
    Form {
        #[serde(default)]
        form: BTreeMap<String, FieldEntry>,
    },
}

impl EntryNode {
    fn child(&self, position: &Position) -> Option<&EntryNode> {
        let child = match (self, position) {
            (Self::List { list }, Position::List { slot }) => list.get(slot),
            (Self::Loop { list }, Position::Loop { slot }) => list.get(slot),
            (Self::Cond { then, .. }, Position::Cond { branch: Branch::Then, slot }) => {
                then.get(slot)
            }
            (
                Self::Cond { otherwise, .. },
                Position::Cond {
                    branch: Branch::Else,
                    slot,
                },
            ) => otherwise.get(slot),
            (Self::Switch { cases, default }, Position::Switch { branch, slot }) => match branch {
                SwitchBranch::Case(index) => cases.get(index).and_then(|list| list.get(slot)),
                SwitchBranch::Default => default.get(slot),
            },
            _ => None,
        };
        child.map(Arc::as_ref)
    }
}

/// Root of the entries tree. The root always mirrors the schema's top-level list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entries {
    root: Arc<EntryNode>,
}

impl Default for Entries {
    fn default() -> Self {
        Self {
            root: Arc::new(EntryNode::List {
                list: BTreeMap::new(),
            }),
        }
    }
}

impl Entries {
    /// Returns the record for `name` at `path`, or an absent record when nothing was
    /// stored there or the stored shape no longer matches the path.
    pub fn get(&self, path: &[Position], name: &str) -> FieldEntry {
        let mut node = self.root.as_ref();
        for position in path {
            let Some(child) = node.child(position) else {
                return FieldEntry::absent();
            };
            node = child;
        }
        match node {
            EntryNode::Form { form } => form.get(name).cloned().unwrap_or_else(FieldEntry::absent),
            _ => FieldEntry::absent(),
        }
    }

    /// Returns a new tree with `value` recorded for `name` at `path`, replacing any
    /// earlier record for that field whatever its keys were.
    pub fn set(
        &self,
        path: &[Position],
        name: &str,
        keys: Vec<FlowValue>,
        value: FlowValue,
    ) -> Self {
        let record = FieldEntry {
            present: true,
            value,
            keys,
        };
        Self {
            root: Arc::new(write_field(Some(self.root.as_ref()), path, name, record)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.root.as_ref() {
            EntryNode::List { list } => list.is_empty(),
            _ => false,
        }
    }
}

fn write_field(
    node: Option<&EntryNode>,
    path: &[Position],
    name: &str,
    record: FieldEntry,
) -> EntryNode {
    let Some((head, rest)) = path.split_first() else {
        let mut form = match node {
            Some(EntryNode::Form { form }) => form.clone(),
            _ => BTreeMap::new(),
        };
        form.insert(name.to_string(), record);
        return EntryNode::Form { form };
    };

    match *head {
        Position::List { slot } => {
            let mut list = match node {
                Some(EntryNode::List { list }) => list.clone(),
                _ => BTreeMap::new(),
            };
            write_slot(&mut list, slot, rest, name, record);
            EntryNode::List { list }
        }
        Position::Loop { slot } => {
            let mut list = match node {
                Some(EntryNode::Loop { list }) => list.clone(),
                _ => BTreeMap::new(),
            };
            write_slot(&mut list, slot, rest, name, record);
            EntryNode::Loop { list }
        }
        Position::Cond { branch, slot } => {
            let (mut then, mut otherwise) = match node {
                Some(EntryNode::Cond { then, otherwise }) => (then.clone(), otherwise.clone()),
                _ => (BTreeMap::new(), BTreeMap::new()),
            };
            let target = match branch {
                Branch::Then => &mut then,
                Branch::Else => &mut otherwise,
            };
            write_slot(target, slot, rest, name, record);
            EntryNode::Cond { then, otherwise }
        }
        Position::Switch { branch, slot } => {
            let (mut cases, mut default) = match node {
                Some(EntryNode::Switch { cases, default }) => (cases.clone(), default.clone()),
                _ => (BTreeMap::new(), BTreeMap::new()),
            };
            let target = match branch {
                SwitchBranch::Case(index) => cases.entry(index).or_default(),
                SwitchBranch::Default => &mut default,
            };
            write_slot(target, slot, rest, name, record);
            EntryNode::Switch { cases, default }
        }
    }
}

fn write_slot(slots: &mut Slots, slot: usize, rest: &[Position], name: &str, record: FieldEntry) {
    let child = write_field(slots.get(&slot).map(Arc::as_ref), rest, name, record);
    slots.insert(slot, Arc::new(child));
}

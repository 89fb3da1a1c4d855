use sf_core::Values;

/// Returns `base` with every key of `updates` written over it. Keys are never removed.
pub(super) fn merge(base: &Values, updates: Values) -> Values {
    let mut merged = base.clone();
    merged.extend(updates);
    merged
}

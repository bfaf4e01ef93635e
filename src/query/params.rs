use std::collections::BTreeMap;

use crate::filter::{FilterError, ParamValue};

/// Parameters that control the list engine and never act as filters
pub const RESERVED_PARAMS: [&str; 4] = ["select", "sort", "page", "limit"];

/// Query-string pairs grouped the way the list engine consumes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    reserved: BTreeMap<String, String>,
    filters: BTreeMap<String, ParamValue>,
}

impl QueryParams {
    /// Group raw `key=value` pairs. `field[op]` keys nest under `field`,
    /// repeated keys collect into a list, reserved keys keep their first value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let (key, value) = (key.into(), value.into());
            if RESERVED_PARAMS.contains(&key.as_str()) {
                params.reserved.entry(key).or_insert(value);
                continue;
            }
            match split_bracket(&key) {
                Some((field, op)) => params.push_operator(field, op, value)?,
                None => push_value(params.filters.entry(key.clone()), &key, value)?,
            }
        }
        Ok(params)
    }

    fn push_operator(&mut self, field: &str, op: &str, value: String) -> Result<(), FilterError> {
        let entry = self
            .filters
            .entry(field.to_string())
            .or_insert_with(|| ParamValue::Operators(BTreeMap::new()));
        match entry {
            ParamValue::Operators(ops) => push_value(ops.entry(op.to_string()), field, value),
            _ => Err(conflict(field)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.reserved.get(name).map(String::as_str)
    }

    pub fn filters(&self) -> &BTreeMap<String, ParamValue> {
        &self.filters
    }
}

fn push_value(
    entry: std::collections::btree_map::Entry<'_, String, ParamValue>,
    field: &str,
    value: String,
) -> Result<(), FilterError> {
    use std::collections::btree_map::Entry;
    match entry {
        Entry::Vacant(slot) => {
            slot.insert(ParamValue::Single(value));
        }
        Entry::Occupied(mut slot) => match slot.get_mut() {
            ParamValue::Single(first) => {
                let first = std::mem::take(first);
                slot.insert(ParamValue::Many(vec![first, value]));
            }
            ParamValue::Many(values) => values.push(value),
            ParamValue::Operators(_) => return Err(conflict(field)),
        },
    }
    Ok(())
}

fn conflict(field: &str) -> FilterError {
    FilterError::InvalidOperatorData(format!(
        "'{}' mixes plain values with bracket operators",
        field
    ))
}

/// `tuition[gte]` → `("tuition", "gte")`
fn split_bracket(key: &str) -> Option<(&str, &str)> {
    let (field, rest) = key.split_once('[')?;
    let op = rest.strip_suffix(']')?;
    if field.is_empty() || op.is_empty() || op.contains(['[', ']']) {
        return None;
    }
    Some((field, op))
}

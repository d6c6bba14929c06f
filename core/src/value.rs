//! Property values for pagegraph entities.
//!
//! Vertex and edge properties are JSON values keyed by name. The bag is a
//! `serde_json::Map`, so a stored property round-trips exactly through the
//! persistence backend and the peer channel.

pub use serde_json::Value;

/// A property bag: string-keyed map of JSON values.
pub type Props = serde_json::Map<String, Value>;

/// Rewrite every string leaf of `value` for which `rewrite` returns a
/// replacement, descending through arrays and objects. Object keys are left
/// alone. Returns the number of strings rewritten.
pub fn rewrite_strings<F>(value: &mut Value, rewrite: &F) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => match rewrite(s) {
            Some(replacement) if replacement != *s => {
                *s = replacement;
                1
            }
            _ => 0,
        },
        Value::Array(items) => items.iter_mut().map(|v| rewrite_strings(v, rewrite)).sum(),
        Value::Object(map) => map.values_mut().map(|v| rewrite_strings(v, rewrite)).sum(),
        _ => 0,
    }
}

/// Apply [`rewrite_strings`] to every value in a property bag.
pub fn rewrite_prop_strings<F>(props: &mut Props, rewrite: &F) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    props
        .values_mut()
        .map(|v| rewrite_strings(v, rewrite))
        .sum()
}

/// Helper macro to create a property bag.
#[macro_export]
macro_rules! props {
    () => {
        $crate::Props::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut map = $crate::Props::new();
            $(
                map.insert($key.to_string(), $crate::Value::from($value));
            )+
            map
        }
    };
}

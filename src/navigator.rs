//! Defensive traversal over semi-structured JSON.
//!
//! The quote-summary payload is inconsistently populated: whole sub-objects
//! go missing, numeric fields show up as strings, and some fields carry a
//! placeholder zero the venue never fills in. Every optional field goes
//! through these helpers, which degrade an anomaly to the `None` sentinel
//! with a single warning instead of failing the quote or the run.

use log::warn;
use serde_json::Value;

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Walks `path` through nested objects, warning and returning `None` on the
/// first missing key or non-object intermediate. On success returns the
/// terminal value together with the breadcrumb used in follow-up warnings.
fn walk<'a>(root: &'a Value, path: &[&str], ctx: &str) -> Option<(&'a Value, String)> {
    let mut current = root;
    let mut crumb = ctx.to_string();
    for key in path {
        let obj = match current.as_object() {
            Some(o) => o,
            None => {
                warn!(
                    "{} is unexpectedly of type {} rather than object, treating as unknown",
                    crumb,
                    type_name(current)
                );
                return None;
            }
        };
        current = match obj.get(*key) {
            Some(v) => v,
            None => {
                warn!("{} unexpectedly lacks key '{}', treating as unknown", crumb, key);
                return None;
            }
        };
        crumb.push_str(&format!("[{}]", key));
    }
    Some((current, crumb))
}

/// Numeric field; values listed in `ignore` are venue placeholders and
/// count as unknown (e.g. the always-zero bid/ask sizes on TSX symbols).
pub fn nav_f64(root: &Value, path: &[&str], ignore: &[f64], ctx: &str) -> Option<f64> {
    let (value, crumb) = walk(root, path, ctx)?;
    let number = match value.as_f64() {
        Some(n) => n,
        None => {
            warn!(
                "{} is unexpectedly of type {} rather than number, treating as unknown",
                crumb,
                type_name(value)
            );
            return None;
        }
    };
    if ignore.contains(&number) {
        warn!("{} has ignored value {}, treating as unknown", crumb, number);
        return None;
    }
    Some(number)
}

/// Integer field (epoch timestamps, millisecond offsets).
pub fn nav_i64(root: &Value, path: &[&str], ctx: &str) -> Option<i64> {
    let (value, crumb) = walk(root, path, ctx)?;
    match value.as_i64() {
        Some(n) => Some(n),
        None => {
            warn!(
                "{} is unexpectedly of type {} rather than integer, treating as unknown",
                crumb,
                type_name(value)
            );
            None
        }
    }
}

/// String field.
pub fn nav_str<'a>(root: &'a Value, path: &[&str], ctx: &str) -> Option<&'a str> {
    let (value, crumb) = walk(root, path, ctx)?;
    match value.as_str() {
        Some(s) => Some(s),
        None => {
            warn!(
                "{} is unexpectedly of type {} rather than string, treating as unknown",
                crumb,
                type_name(value)
            );
            None
        }
    }
}

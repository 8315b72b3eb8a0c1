//! Chunk merging rules for incrementally streamed values.
//!
//! Every run folds its streamed chunks through [`merge`] in production order,
//! so the final output reported by an end event is always the merge of the
//! chunks that preceded it. The rules are type-directed:
//!
//! - `Null` is the identity on either side
//! - strings concatenate
//! - arrays concatenate, preserving order (no de-duplication)
//! - objects merge key-wise; shared keys recurse through the same rules
//! - numbers add (token/usage style accumulators)
//! - any other pairing is a [`MergeError`]
//!
//! ```
//! use chainstream::merge::merge;
//! use serde_json::json;
//!
//! assert_eq!(merge(Some(json!("he")), json!("llo")).unwrap(), json!("hello"));
//! assert_eq!(merge(Some(json!(1)), json!(1)).unwrap(), json!(2));
//! assert_eq!(
//!     merge(Some(json!({"a": "x"})), json!({"a": "y", "b": 1})).unwrap(),
//!     json!({"a": "xy", "b": 1}),
//! );
//! assert!(merge(Some(json!([1])), json!("nope")).is_err());
//! ```

use miette::Diagnostic;
use serde_json::{Number, Value};
use thiserror::Error;

/// Errors raised when two chunks cannot be combined.
#[derive(Debug, Error, Diagnostic)]
pub enum MergeError {
    /// The two chunks have shapes with no defined combination rule.
    #[error("cannot merge {left} chunk with {right} chunk")]
    #[diagnostic(
        code(chainstream::merge::incompatible),
        help("chunks of one run must share a shape: string+string, list+list, map+map or number+number")
    )]
    Incompatible {
        left: &'static str,
        right: &'static str,
    },

    /// Numeric accumulation produced a value JSON cannot represent.
    #[error("numeric merge result is not representable")]
    #[diagnostic(code(chainstream::merge::not_representable))]
    NotRepresentable,
}

/// The "combine with" capability used by the merge rules.
///
/// [`serde_json::Value`] carries the generic rules; embedders with richer
/// chunk types can implement `Combine` for their own types and convert at the
/// boundary. A custom implementation always takes precedence over the generic
/// rules for that type.
pub trait Combine: Sized {
    fn combine(self, other: Self) -> Result<Self, MergeError>;
}

impl Combine for Value {
    fn combine(self, other: Self) -> Result<Self, MergeError> {
        match (self, other) {
            (Value::Null, next) => Ok(next),
            (prev, Value::Null) => Ok(prev),
            (Value::String(mut prev), Value::String(next)) => {
                prev.push_str(&next);
                Ok(Value::String(prev))
            }
            (Value::Array(mut prev), Value::Array(next)) => {
                prev.extend(next);
                Ok(Value::Array(prev))
            }
            (Value::Object(mut prev), Value::Object(next)) => {
                for (key, value) in next {
                    match prev.remove(&key) {
                        Some(existing) => {
                            prev.insert(key, existing.combine(value)?);
                        }
                        None => {
                            prev.insert(key, value);
                        }
                    }
                }
                Ok(Value::Object(prev))
            }
            (Value::Number(prev), Value::Number(next)) => combine_numbers(prev, next),
            (prev, next) => Err(MergeError::Incompatible {
                left: value_type(&prev),
                right: value_type(&next),
            }),
        }
    }
}

/// Fold one more chunk into an accumulator. `None` means no chunk has been
/// observed yet, so the first chunk passes through unchanged.
pub fn merge(prev: Option<Value>, next: Value) -> Result<Value, MergeError> {
    match prev {
        None => Ok(next),
        Some(prev) => prev.combine(next),
    }
}

/// Merge a whole chunk sequence in production order.
pub fn fold_chunks<I>(chunks: I) -> Result<Option<Value>, MergeError>
where
    I: IntoIterator<Item = Value>,
{
    let mut acc = None;
    for chunk in chunks {
        acc = Some(merge(acc.take(), chunk)?);
    }
    Ok(acc)
}

/// Integer operands stay exact: their sum is taken with checked arithmetic
/// (promoting to u64 where that keeps it representable) and overflow is a
/// [`MergeError::NotRepresentable`], never a lossy float. Float arithmetic is
/// only used when an operand already is a float.
fn combine_numbers(prev: Number, next: Number) -> Result<Value, MergeError> {
    if prev.is_f64() || next.is_f64() {
        return match (prev.as_f64(), next.as_f64()) {
            (Some(a), Some(b)) => Number::from_f64(a + b)
                .map(Value::Number)
                .ok_or(MergeError::NotRepresentable),
            _ => Err(MergeError::NotRepresentable),
        };
    }
    if let (Some(a), Some(b)) = (prev.as_i64(), next.as_i64())
        && let Some(sum) = a.checked_add(b)
    {
        return Ok(Value::from(sum));
    }
    if let (Some(a), Some(b)) = (prev.as_u64(), next.as_u64())
        && let Some(sum) = a.checked_add(b)
    {
        return Ok(Value::from(sum));
    }
    Err(MergeError::NotRepresentable)
}

/// Human-readable type name for a JSON value, used in merge diagnostics.
pub(crate) fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

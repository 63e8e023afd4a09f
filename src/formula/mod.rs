//! Safe arithmetic formula evaluation.
//!
//! A formula is evaluated in four steps: field references are replaced with their
//! current numeric values, the result is checked against an arithmetic character
//! whitelist, tokenized, and finally reduced. No step ever compiles or executes
//! anything beyond `+ - * /` on finite numbers, and every failure degrades to `None`.

mod reducer;
mod substitution;
mod tokenizer;

use crate::schema::Value;
use ahash::AHashMap;

/// Evaluates `formula` against the current field values.
///
/// Returns `None` when a referenced field is missing or non-numeric, the formula contains
/// anything but arithmetic, parentheses are unbalanced, a division by zero occurs, or the
/// result is not finite.
///
/// ```
/// use santei::formula::evaluate;
/// use santei::schema::Value;
/// use ahash::AHashMap;
///
/// let mut values = AHashMap::new();
/// values.insert("Length".to_string(), Value::Decimal(10.0));
/// values.insert("Width".to_string(), Value::Integer(5));
/// assert_eq!(evaluate("(Length - 2) * {Width}", &values), Some(40.0));
/// assert_eq!(evaluate("Length / 0", &values), None);
/// ```
pub fn evaluate(formula: &str, values: &AHashMap<String, Value>) -> Option<f64> {
    let substituted = substitution::substitute(formula, values)?;
    let tokens = tokenizer::tokenize(&substituted)?;
    if tokens.is_empty() {
        return None;
    }
    reducer::reduce(tokens)
}

/// Rounds `value` to `precision` decimal digits, half away from zero.
///
/// Rounding an already rounded value returns it unchanged. Precisions beyond what an
/// `f64` can represent leave the value as is.
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(308) as i32);
    let scaled = value * factor;
    // Past 2^52 every f64 is already integral, so scaling cannot add precision.
    if !scaled.is_finite() || scaled.abs() >= 4_503_599_627_370_496.0 {
        return value;
    }
    // Adding 0.0 folds -0.0 into 0.0.
    (scaled.round() / factor) + 0.0
}

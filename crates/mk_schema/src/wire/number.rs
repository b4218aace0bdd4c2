//! Numeric coercion rules.
//!
//! JSON numbers convert into any numeric type that can hold them exactly.
//! An integral value written with a fraction or an exponent (`10.0`, `1e3`)
//! is accepted by integer targets; a fractional one (`10.5`) is not. With
//! lenient numbers enabled, numeric strings are accepted as well.

use std::borrow::Cow;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use serde_json::Value;

use crate::error::DecodeError;

fn numeric_text<'v>(
    value: &'v Value,
    lenient: bool,
    target: &'static str,
) -> Result<Cow<'v, str>, DecodeError> {
    match value {
        Value::Number(n) => Ok(Cow::Owned(n.to_string())),
        Value::String(s) if lenient => Ok(Cow::Borrowed(s.trim())),
        other => Err(DecodeError::shape(target, other)),
    }
}

/// Decimal digits of `u128::MAX`, enough for every integer target.
const MAX_INTEGER_DIGITS: i64 = 39;

fn exact_integer(text: &str) -> Option<BigDecimal> {
    let decimal = BigDecimal::from_str(text).ok()?;
    if decimal.is_zero() {
        return Some(BigDecimal::zero());
    }
    // Rescaling costs as much as the exponent is large, so bound the
    // magnitude by its digit count first.
    let digits = i64::try_from(decimal.digits()).ok()?;
    let integral_digits = digits.saturating_sub(decimal.fractional_digit_count());
    if !(1..=MAX_INTEGER_DIGITS).contains(&integral_digits) {
        return None;
    }
    decimal.is_integer().then(|| decimal.with_scale(0))
}

fn integral_i128(text: &str) -> Option<i128> {
    text.parse::<i128>()
        .ok()
        .or_else(|| exact_integer(text)?.to_string().parse().ok())
}

fn integral_u128(text: &str) -> Option<u128> {
    text.parse::<u128>()
        .ok()
        .or_else(|| exact_integer(text)?.to_string().parse().ok())
}

pub(crate) fn decode_integer<I: TryFrom<i128>>(
    value: &Value,
    lenient: bool,
    target: &'static str,
) -> Result<I, DecodeError> {
    if let Value::Number(n) = value
        && let Some(i) = n.as_i64()
    {
        return I::try_from(i128::from(i)).map_err(|_| DecodeError::coercion(value, target));
    }
    let text = numeric_text(value, lenient, target)?;
    integral_i128(&text)
        .and_then(|i| I::try_from(i).ok())
        .ok_or_else(|| DecodeError::coercion(value, target))
}

pub(crate) fn decode_u128(value: &Value, lenient: bool) -> Result<u128, DecodeError> {
    let text = numeric_text(value, lenient, "u128")?;
    integral_u128(&text).ok_or_else(|| DecodeError::coercion(value, "u128"))
}

pub(crate) fn decode_f64(
    value: &Value,
    lenient: bool,
    target: &'static str,
) -> Result<f64, DecodeError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if lenient => s.trim().parse::<f64>().ok(),
        other => return Err(DecodeError::shape(target, other)),
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| DecodeError::coercion(value, target))
}

pub(crate) fn decode_f32(value: &Value, lenient: bool) -> Result<f32, DecodeError> {
    let wide = decode_f64(value, lenient, "f32")?;
    if wide.abs() > f64::from(f32::MAX) {
        return Err(DecodeError::coercion(value, "f32"));
    }
    Ok(wide as f32)
}

pub(crate) fn decode_decimal(value: &Value, lenient: bool) -> Result<BigDecimal, DecodeError> {
    let text = numeric_text(value, lenient, "decimal")?;
    BigDecimal::from_str(&text).map_err(|_| DecodeError::coercion(value, "decimal"))
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode_decimal, decode_f32, decode_f64, decode_integer, decode_u128};
    use crate::error::DecodeError;

    #[test]
    fn integers_accept_integral_numbers_only() {
        assert_eq!(decode_integer::<i16>(&json!(10), false, "i16").unwrap(), 10);
        assert_eq!(decode_integer::<i16>(&json!(10.0), false, "i16").unwrap(), 10);
        assert_eq!(decode_integer::<i32>(&json!(1e3), false, "i32").unwrap(), 1000);
        assert!(matches!(
            decode_integer::<i16>(&json!(10.5), false, "i16"),
            Err(DecodeError::Coercion { target: "i16", .. })
        ));
        assert!(matches!(
            decode_integer::<i8>(&json!(300), false, "i8"),
            Err(DecodeError::Coercion { .. })
        ));
        assert!(matches!(
            decode_integer::<u8>(&json!(-1), false, "u8"),
            Err(DecodeError::Coercion { .. })
        ));
    }

    #[test]
    fn huge_exponents_are_rejected_without_expanding() {
        let huge: serde_json::Value = serde_json::from_str("1e3000000").unwrap();
        assert!(matches!(
            decode_integer::<i16>(&huge, false, "i16"),
            Err(DecodeError::Coercion { target: "i16", .. })
        ));
        assert!(decode_u128(&huge, false).is_err());

        let tiny: serde_json::Value = serde_json::from_str("1e-3000000").unwrap();
        assert!(decode_integer::<i64>(&tiny, false, "i64").is_err());

        let zero: serde_json::Value = serde_json::from_str("0e-3000000").unwrap();
        assert_eq!(decode_integer::<i64>(&zero, false, "i64").unwrap(), 0);
        assert_eq!(decode_integer::<i64>(&json!("2.0e1"), true, "i64").unwrap(), 20);
    }

    #[test]
    fn numeric_strings_depend_on_leniency() {
        assert_eq!(decode_integer::<i64>(&json!(" 42 "), true, "i64").unwrap(), 42);
        assert!(matches!(
            decode_integer::<i64>(&json!("42"), false, "i64"),
            Err(DecodeError::Shape { .. })
        ));
        assert_eq!(decode_f64(&json!("2.5"), true, "f64").unwrap(), 2.5);
        assert!(decode_f64(&json!("NaN"), true, "f64").is_err());
    }

    #[test]
    fn wide_and_exact_targets() {
        let max = json!(u128::MAX);
        assert_eq!(decode_u128(&max, false).unwrap(), u128::MAX);
        assert_eq!(decode_f64(&json!(10.5), false, "f64").unwrap(), 10.5);
        assert!(decode_f32(&json!(1e300), false).is_err());
        assert_eq!(
            decode_decimal(&json!(0.1), false).unwrap().to_string(),
            "0.1"
        );
    }
}

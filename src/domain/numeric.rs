//! Lenient numeric reads for user-editable fields.
//!
//! Form fields arrive as JSON numbers, numeric strings (possibly with a
//! decimal comma), empty strings or null. Anything that does not parse as a
//! number is treated as absent so it can never poison a sum.

use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a raw JSON value into a decimal, `None` when it is not numeric.
pub fn coerce(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            parse(&text).or_else(|| n.as_f64().and_then(Decimal::from_f64))
        }
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            parse(&cleaned)
        }
        _ => None,
    }
}

fn parse(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

/// Serde adapter: non-numeric and missing values read as zero.
pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce(&value).unwrap_or(Decimal::ZERO))
}

/// Serde adapter: non-numeric values read as unset.
pub fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce(&value))
}

/// Clamp at zero; negative user input never reaches an aggregate.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// `base * percent / 100`, saturating instead of overflowing.
pub fn percent_of(base: Decimal, percent: Decimal) -> Decimal {
    base.saturating_mul(percent)
        .checked_div(Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::MAX)
}

/// Saturating sum over any iterator of decimals.
pub fn sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_parse() {
        assert_eq!(coerce(&json!(12.5)), Some(Decimal::new(125, 1)));
        assert_eq!(coerce(&json!(7)), Some(Decimal::from(7)));
        assert_eq!(coerce(&json!("12,5")), Some(Decimal::new(125, 1)));
        assert_eq!(coerce(&json!(" 1 200.00 ")), Some(Decimal::new(120000, 2)));
        assert_eq!(coerce(&json!("1e3")), Some(Decimal::from(1000)));
    }

    #[test]
    fn garbage_reads_as_absent() {
        assert_eq!(coerce(&json!("abc")), None);
        assert_eq!(coerce(&json!("")), None);
        assert_eq!(coerce(&json!(null)), None);
        assert_eq!(coerce(&json!(true)), None);
        assert_eq!(coerce(&json!([1, 2])), None);
    }

    #[test]
    fn percent_of_and_sum() {
        assert_eq!(
            percent_of(Decimal::from(1000), Decimal::new(255, 1)),
            Decimal::from(255)
        );
        assert_eq!(
            sum([Decimal::ONE, Decimal::TWO, Decimal::from(3)]),
            Decimal::from(6)
        );
        assert_eq!(sum([Decimal::MAX, Decimal::ONE]), Decimal::MAX);
    }
}

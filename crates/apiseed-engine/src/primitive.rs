//! Primitive synthesizer: scalar values for a single schema node
//!
//! Everything here is a pure function of the schema constraints and the RNG.
//! Composition, `$ref` resolution and examples are handled by the generator.

use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Number, Value};

use apiseed_core::Schema;

/// Maximum string length (prevents OOM on absurd `maxLength` values).
pub const MAX_STRING_LEN: usize = 10_000;

/// Default lower bound of decimal strings.
const DECIMAL_MIN: f64 = 1.0;
/// Default upper bound of decimal strings.
const DECIMAL_MAX: f64 = 99_999_999_999.0;

const ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn random_alnum(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| ALNUM[rng.gen_range(0..ALNUM.len())] as char)
        .collect()
}

/// Alphanumeric string sized from the property name.
pub fn name_sized_string(rng: &mut impl Rng, name: &str) -> String {
    let base = name.chars().count().clamp(1, MAX_STRING_LEN);
    let len = rng.gen_range(base..base + 4);
    random_alnum(rng, len)
}

/// Effective `[min, max]` string length. `None` when neither bound is set.
#[must_use]
pub fn length_bounds(schema: &Schema) -> Option<(usize, usize)> {
    let cap = |v: u64| usize::try_from(v).unwrap_or(MAX_STRING_LEN).min(MAX_STRING_LEN);
    match (schema.min_length.map(cap), schema.max_length.map(cap)) {
        (None, None) => None,
        (Some(min), None) => Some((min, (min + 10).min(MAX_STRING_LEN).max(min))),
        (None, Some(max)) => Some((1.min(max), max)),
        (Some(min), Some(max)) => Some((min, max.max(min))),
    }
}

/// Alphanumeric string with length in `[min, max]`.
pub fn bounded_string(rng: &mut impl Rng, min: usize, max: usize) -> String {
    let len = rng.gen_range(min..=max.max(min));
    random_alnum(rng, len)
}

/// Random number honouring whichever bounds are present.
///
/// - both bounds: uniform in `[min, max)`
/// - `min` only: `min + r`
/// - `max` only: `r * max`, or `max - r` when `max <= 0`
/// - neither: `r * 10`
pub fn random_number(rng: &mut impl Rng, min: Option<f64>, max: Option<f64>) -> f64 {
    let r: f64 = rng.r#gen();
    match (min, max) {
        (Some(min), Some(max)) if max > min => r * (max - min) + min,
        (Some(min), Some(_)) => min,
        (Some(min), None) => r + min,
        (None, Some(max)) if max > 0.0 => r * max,
        (None, Some(max)) => max - r,
        (None, None) => r * 10.0,
    }
}

/// Integer within the schema bounds; `int32` schemas stay in `i32` range.
pub fn integer_value(rng: &mut impl Rng, schema: &Schema) -> Value {
    let raw = random_number(rng, schema.minimum, schema.maximum).floor();
    let (width_min, width_max) = if schema.is_short_integer() {
        (f64::from(i32::MIN), f64::from(i32::MAX))
    } else {
        (i64::MIN as f64, i64::MAX as f64)
    };
    let lo = schema.minimum.map_or(width_min, f64::ceil).max(width_min);
    let hi = schema.maximum.map_or(width_max, f64::floor).min(width_max);
    let clamped = if lo <= hi {
        raw.clamp(lo, hi)
    } else {
        raw.clamp(width_min, width_max)
    };
    Value::Number((clamped as i64).into())
}

/// Number within the schema bounds; `float` schemas carry `f32` precision.
pub fn number_value(rng: &mut impl Rng, schema: &Schema) -> Value {
    let mut n = random_number(rng, schema.minimum, schema.maximum);
    if schema.is_float() {
        n = f64::from(n as f32);
    }
    if let Some(min) = schema.minimum {
        n = n.max(min);
    }
    if let Some(max) = schema.maximum {
        n = n.min(max);
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// Decimal rendered as a string with two fractional digits, rounded half-up.
pub fn decimal_string(rng: &mut impl Rng, schema: &Schema) -> String {
    let min = schema.minimum.unwrap_or(DECIMAL_MIN);
    let max = schema.maximum.unwrap_or(DECIMAL_MAX);
    let raw = random_number(rng, Some(min), Some(max));
    let mut decimal = Decimal::from_f64(raw)
        .or_else(|| Decimal::from_f64(min))
        .unwrap_or_default()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    decimal.rescale(2);
    decimal.to_string()
}

/// Array length: `hint` clamped into `[minItems, maxItems]`.
///
/// `minItems` defaults to 1; `maxItems` defaults to `minItems + 1` when unset
/// or zero.
#[must_use]
pub fn array_length(hint: usize, min_items: Option<u64>, max_items: Option<u64>) -> usize {
    let min = min_items.map_or(1, |v| usize::try_from(v).unwrap_or(usize::MAX));
    let max = match max_items {
        None | Some(0) => min.saturating_add(1),
        Some(v) => usize::try_from(v).unwrap_or(usize::MAX),
    };
    hint.clamp(min, max.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use serde_json::json;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn name_sized_string_length() {
        let mut rng = rng();
        for _ in 0..50 {
            let s = name_sized_string(&mut rng, "street");
            assert!((6..10).contains(&s.len()), "len {}", s.len());
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn length_bounds_defaults() {
        assert_eq!(length_bounds(&schema(json!({"type": "string"}))), None);
        assert_eq!(
            length_bounds(&schema(json!({"type": "string", "minLength": 4}))),
            Some((4, 14))
        );
        assert_eq!(
            length_bounds(&schema(json!({"type": "string", "maxLength": 0}))),
            Some((0, 0))
        );
        assert_eq!(
            length_bounds(&schema(json!({"type": "string", "minLength": 5, "maxLength": 2}))),
            Some((5, 5))
        );
    }

    #[test]
    fn random_number_rules() {
        let mut rng = rng();
        for _ in 0..100 {
            let both = random_number(&mut rng, Some(5.0), Some(7.0));
            assert!((5.0..7.0).contains(&both));
            let min_only = random_number(&mut rng, Some(5.0), None);
            assert!((5.0..6.0).contains(&min_only));
            let max_only = random_number(&mut rng, None, Some(3.0));
            assert!((0.0..3.0).contains(&max_only));
            let negative_max = random_number(&mut rng, None, Some(-2.0));
            assert!(negative_max <= -2.0);
            let neither = random_number(&mut rng, None, None);
            assert!((0.0..10.0).contains(&neither));
        }
    }

    #[test]
    fn integer_respects_bounds() {
        let mut rng = rng();
        let s = schema(json!({"type": "integer", "minimum": 10, "maximum": 20}));
        for _ in 0..100 {
            let n = integer_value(&mut rng, &s).as_i64().unwrap();
            assert!((10..=20).contains(&n));
        }
    }

    #[test]
    fn short_integer_stays_in_i32() {
        let mut rng = rng();
        let s = schema(json!({"type": "integer", "format": "int32", "minimum": 1e12}));
        let n = integer_value(&mut rng, &s).as_i64().unwrap();
        assert_eq!(n, i64::from(i32::MAX));
    }

    #[test]
    fn fractional_bounds_round_inward() {
        let mut rng = rng();
        let s = schema(json!({"type": "integer", "minimum": 1.5, "maximum": 2.5}));
        for _ in 0..20 {
            assert_eq!(integer_value(&mut rng, &s), json!(2));
        }
    }

    #[test]
    fn float_number_in_bounds() {
        let mut rng = rng();
        let s = schema(json!({"type": "number", "format": "float", "minimum": 0.1, "maximum": 0.2}));
        for _ in 0..100 {
            let n = number_value(&mut rng, &s).as_f64().unwrap();
            assert!((0.1..=0.2).contains(&n));
        }
    }

    #[test]
    fn decimal_string_has_two_places() {
        let mut rng = rng();
        let s = schema(json!({"type": "string", "format": "number", "minimum": 10, "maximum": 20}));
        for _ in 0..50 {
            let text = decimal_string(&mut rng, &s);
            let (int, frac) = text.split_once('.').unwrap();
            assert_eq!(frac.len(), 2, "{text}");
            let value: f64 = text.parse().unwrap();
            assert!((10.0..=20.0).contains(&value), "{text}");
            assert!(int.parse::<u64>().is_ok());
        }
    }

    #[test]
    fn array_length_defaults() {
        assert_eq!(array_length(2, None, None), 2);
        assert_eq!(array_length(5, None, None), 2);
        assert_eq!(array_length(0, None, None), 1);
        assert_eq!(array_length(2, Some(3), Some(0)), 3);
        assert_eq!(array_length(9, Some(4), Some(2)), 4);
    }

    proptest! {
        #[test]
        fn array_length_is_clamped(hint in 0usize..20, a in 1u64..10, extra in 0u64..10) {
            let b = a + extra;
            let len = array_length(hint, Some(a), Some(b));
            let expected = hint.clamp(usize::try_from(a).unwrap(), usize::try_from(b).unwrap());
            prop_assert_eq!(len, expected);
        }

        #[test]
        fn bounded_string_hits_exact_length(n in 0usize..64, seed in any::<u64>()) {
            let mut rng = SmallRng::seed_from_u64(seed);
            prop_assert_eq!(bounded_string(&mut rng, n, n).len(), n);
        }
    }
}

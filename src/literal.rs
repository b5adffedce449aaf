//! Datatype-aware literal parsing and equivalence (spec.md §3, §4.1).
//!
//! The raw `Term::Literal` is just an interned lexical form plus an optional
//! suffix; this module is where "is `"1"^^xsd:integer` the same value as
//! `"1.0"^^xsd:decimal`" gets decided. Two unifier variants exist (spec.md
//! §4.1): the general one allows boolean-value equivalence; the list-append
//! variant additionally allows integer/decimal cross-equality.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::term::{Interner, Literal, LiteralSuffix};

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_DATETIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const XSD_DURATION: &str = "http://www.w3.org/2001/XMLSchema#duration";

/// A decoded numeric value, arbitrary-precision for integers, fixed-point
/// scaled for decimals. Float/double are plain `f64` with the additional
/// lexicals `INF`, `-INF`, `NaN` accepted on the way in.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericValue {
    Integer(BigInt),
    /// `(unscaled, scale)` such that the value is `unscaled / 10^scale`.
    Decimal(BigInt, u32),
    Float(f32),
    Double(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumericRank {
    Integer = 0,
    Decimal = 1,
    Float = 2,
    Double = 3,
}

impl NumericValue {
    pub fn rank(&self) -> NumericRank {
        match self {
            NumericValue::Integer(_) => NumericRank::Integer,
            NumericValue::Decimal(..) => NumericRank::Decimal,
            NumericValue::Float(_) => NumericRank::Float,
            NumericValue::Double(_) => NumericRank::Double,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            NumericValue::Integer(i) => i.to_string().parse().unwrap_or(f64::NAN),
            NumericValue::Decimal(unscaled, scale) => {
                let s = unscaled.to_string();
                format!("{}e-{}", s, scale).parse().unwrap_or(f64::NAN)
            }
            NumericValue::Float(f) => *f as f64,
            NumericValue::Double(d) => *d,
        }
    }

    /// Value equality used by general unification: numeric literals of
    /// matching *rank* are equal by value (spec.md §3); cross-rank numeric
    /// equality is only ever invoked by the list-append variant for the
    /// integer/decimal case specifically.
    pub fn equals_same_rank(&self, other: &NumericValue) -> bool {
        match (self, other) {
            (NumericValue::Integer(a), NumericValue::Integer(b)) => a == b,
            (NumericValue::Decimal(au, asc), NumericValue::Decimal(bu, bsc)) => {
                normalize_decimal(au, *asc) == normalize_decimal(bu, *bsc)
            }
            (NumericValue::Float(a), NumericValue::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            (NumericValue::Double(a), NumericValue::Double(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            _ => false,
        }
    }

    /// Integer <-> decimal value equality, for the list-append unifier
    /// variant only (spec.md §3, §4.1).
    pub fn equals_integer_decimal(&self, other: &NumericValue) -> bool {
        match (self, other) {
            (NumericValue::Integer(i), NumericValue::Decimal(u, s))
            | (NumericValue::Decimal(u, s), NumericValue::Integer(i)) => {
                normalize_decimal(u, *s) == normalize_decimal(i, 0)
            }
            _ => self.equals_same_rank(other),
        }
    }
}

/// Reduce a scaled integer to its lowest terms by stripping trailing zeros,
/// so `1.10` (11, scale 2) and `1.1` (11, scale 1) compare equal.
fn normalize_decimal(unscaled: &BigInt, scale: u32) -> (BigInt, u32) {
    let ten = BigInt::from(10);
    let mut u = unscaled.clone();
    let mut s = scale;
    while s > 0 && (&u % &ten).is_zero() {
        u /= &ten;
        s -= 1;
    }
    (u, s)
}

pub fn parse_numeric(lexical: &str, datatype: Option<&str>) -> Option<NumericValue> {
    match datatype {
        Some(XSD_INTEGER) => lexical.trim().parse::<BigInt>().ok().map(NumericValue::Integer),
        Some(XSD_DECIMAL) => parse_decimal(lexical),
        Some(XSD_FLOAT) => parse_float_lexical(lexical).map(|f| NumericValue::Float(f as f32)),
        Some(XSD_DOUBLE) => parse_float_lexical(lexical).map(NumericValue::Double),
        None => {
            // Untyped numeric literal as produced directly by the N3 grammar
            // (e.g. `42`, `3.14`, `1.0e10`): infer the most specific rank.
            if let Ok(i) = lexical.trim().parse::<BigInt>() {
                Some(NumericValue::Integer(i))
            } else if lexical.contains(['e', 'E']) {
                parse_float_lexical(lexical).map(NumericValue::Double)
            } else {
                parse_decimal(lexical)
            }
        }
        Some(_) => None,
    }
}

fn parse_decimal(lexical: &str) -> Option<NumericValue> {
    let s = lexical.trim();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(r) => (-1, r),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rest, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let scale = frac_part.len() as u32;
    let digits = format!("{}{}", int_part, frac_part);
    let digits = if digits.is_empty() { "0" } else { &digits };
    let unscaled: BigInt = digits.parse().ok()?;
    Some(NumericValue::Decimal(unscaled * sign, scale))
}

fn parse_float_lexical(lexical: &str) -> Option<f64> {
    match lexical.trim() {
        "INF" | "+INF" | "Infinity" => Some(f64::INFINITY),
        "-INF" | "-Infinity" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

pub fn format_numeric(value: &NumericValue) -> String {
    match value {
        NumericValue::Integer(i) => i.to_string(),
        NumericValue::Decimal(unscaled, scale) => format_decimal(unscaled, *scale),
        NumericValue::Float(f) => format_float(*f as f64),
        NumericValue::Double(d) => format_float(*d),
    }
}

fn format_decimal(unscaled: &BigInt, scale: u32) -> String {
    if scale == 0 {
        return format!("{}.0", unscaled);
    }
    let neg = unscaled.is_negative();
    let digits = unscaled.abs().to_string();
    let digits = if digits.len() <= scale as usize {
        format!("{}{}", "0".repeat(scale as usize - digits.len() + 1), digits)
    } else {
        digits
    };
    let split_at = digits.len() - scale as usize;
    let (int_part, frac_part) = digits.split_at(split_at);
    format!("{}{}.{}", if neg { "-" } else { "" }, int_part, frac_part)
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "INF".to_string() } else { "-INF".to_string() }
    } else {
        format!("{:E}", f)
    }
}

pub fn parse_boolean(lexical: &str) -> Option<bool> {
    match lexical.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Resolve a literal's datatype IRI string, if any (`None` for a plain or
/// language-tagged literal).
pub fn datatype_str<'a>(interner: &'a Interner, lit: &Literal) -> Option<&'a str> {
    match lit.suffix {
        LiteralSuffix::Datatype(dt) => Some(interner.resolve(dt)),
        LiteralSuffix::Plain | LiteralSuffix::Lang(_) => None,
    }
}

/// Plain string and `^^xsd:string` are equivalent (spec.md §3); language
/// tags are never conflated with plain strings.
pub fn string_equivalent(interner: &Interner, a: &Literal, b: &Literal) -> bool {
    let a_is_string_like = matches!(a.suffix, LiteralSuffix::Plain)
        || datatype_str(interner, a) == Some(XSD_STRING);
    let b_is_string_like = matches!(b.suffix, LiteralSuffix::Plain)
        || datatype_str(interner, b) == Some(XSD_STRING);
    a_is_string_like && b_is_string_like && interner.resolve(a.lexical) == interner.resolve(b.lexical)
}

pub fn is_lang_tagged(lit: &Literal) -> bool {
    matches!(lit.suffix, LiteralSuffix::Lang(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_trailing_zero_equivalence() {
        let a = parse_numeric("1.10", Some(XSD_DECIMAL)).unwrap();
        let b = parse_numeric("1.1", Some(XSD_DECIMAL)).unwrap();
        assert!(a.equals_same_rank(&b));
    }

    #[test]
    fn integer_decimal_cross_equality_only_in_append_variant() {
        let i = parse_numeric("3", Some(XSD_INTEGER)).unwrap();
        let d = parse_numeric("3.0", Some(XSD_DECIMAL)).unwrap();
        assert!(!i.equals_same_rank(&d));
        assert!(i.equals_integer_decimal(&d));
    }

    #[test]
    fn float_accepts_inf_and_nan() {
        assert_eq!(parse_numeric("INF", Some(XSD_FLOAT)), Some(NumericValue::Float(f32::INFINITY)));
        match parse_numeric("NaN", Some(XSD_DOUBLE)) {
            Some(NumericValue::Double(d)) => assert!(d.is_nan()),
            _ => panic!("expected NaN"),
        }
    }

    #[test]
    fn format_decimal_preserves_scale() {
        let v = parse_numeric("42.50", Some(XSD_DECIMAL)).unwrap();
        assert_eq!(format_numeric(&v), "42.50");
    }
}

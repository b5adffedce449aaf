//! `math:*` (spec.md §4.5 Arithmetic).

use num_bigint::BigInt;
use num_traits::Signed;

use super::bind_or_check;
use crate::engine::Engine;
use crate::literal::{self, NumericValue};
use crate::subst::Substitution;
use crate::term::Term;
use crate::triple::Triple;

pub const KNOWN: &[&str] = &[
    "equalTo", "notEqualTo", "lessThan", "notLessThan", "greaterThan", "notGreaterThan",
    "sum", "product", "difference", "quotient", "exponentiation",
    "absoluteValue", "remainder", "integerQuotient",
    "sin", "cos", "tan", "sinh", "cosh", "tanh", "asin", "acos", "atan",
    "rounded", "degrees", "negation",
];

/// Unary relations eligible for the "fully-unbound escape" (spec.md §4.4):
/// succeed without binding when both subject and object are unbound.
const UNARY_ESCAPE: &[&str] = &[
    "sin", "cos", "tan", "sinh", "cosh", "tanh", "asin", "acos", "atan", "degrees", "negation",
];

pub fn eval(engine: &mut Engine, goal: &Triple, local: &str) -> Vec<Substitution> {
    match local {
        "equalTo" | "notEqualTo" | "lessThan" | "notLessThan" | "greaterThan" | "notGreaterThan" => {
            compare(engine, goal, local)
        }
        "sum" => fold_list(engine, goal, |acc, v| add(acc, v)),
        "product" => fold_list(engine, goal, |acc, v| mul(acc, v)),
        "difference" => binary_bidi(engine, goal, |a, b| subtract(a, b)),
        "quotient" => binary(engine, goal, |a, b| divide(a, b)),
        "exponentiation" => binary(engine, goal, |a, b| power(a, b)),
        "absoluteValue" => unary(engine, goal, |v| Some(abs(v))),
        "remainder" => binary(engine, goal, |a, b| remainder(a, b)),
        "integerQuotient" => binary(engine, goal, |a, b| integer_quotient(a, b)),
        "rounded" => unary(engine, goal, |v| Some(rounded(v))),
        "degrees" => unary_escape(engine, goal, local, |v| Some(NumericValue::Double(v.to_f64().to_degrees()))),
        "negation" => unary_escape(engine, goal, local, |v| Some(negate(v))),
        "sin" => unary_escape(engine, goal, local, |v| Some(NumericValue::Double(v.to_f64().sin()))),
        "cos" => unary_escape(engine, goal, local, |v| Some(NumericValue::Double(v.to_f64().cos()))),
        "tan" => unary_escape(engine, goal, local, |v| Some(NumericValue::Double(v.to_f64().tan()))),
        "sinh" => unary_escape(engine, goal, local, |v| Some(NumericValue::Double(v.to_f64().sinh()))),
        "cosh" => unary_escape(engine, goal, local, |v| Some(NumericValue::Double(v.to_f64().cosh()))),
        "tanh" => unary_escape(engine, goal, local, |v| Some(NumericValue::Double(v.to_f64().tanh()))),
        "asin" => unary_escape(engine, goal, local, |v| Some(NumericValue::Double(v.to_f64().asin()))),
        "acos" => unary_escape(engine, goal, local, |v| Some(NumericValue::Double(v.to_f64().acos()))),
        "atan" => unary_escape(engine, goal, local, |v| Some(NumericValue::Double(v.to_f64().atan()))),
        _ => Vec::new(),
    }
}

/// `math:sum`/`math:product`: fold a list of numeric literals
/// (spec.md §4.5 "n-ary sum and product over a list").
fn fold_list(
    engine: &mut Engine,
    goal: &Triple,
    op: impl Fn(NumericValue, NumericValue) -> NumericValue,
) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    let mut values = Vec::with_capacity(items.len());
    for item in &items {
        let Some(v) = term_numeric(engine, item) else { return Vec::new() };
        values.push(v);
    }
    let mut iter = values.into_iter();
    let Some(mut acc) = iter.next() else { return Vec::new() };
    for v in iter {
        acc = op(acc, v);
    }
    let value = numeric_term(engine, &acc);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn negate(v: NumericValue) -> NumericValue {
    match v {
        NumericValue::Integer(i) => NumericValue::Integer(-i),
        NumericValue::Decimal(u, s) => NumericValue::Decimal(-u, s),
        NumericValue::Float(f) => NumericValue::Float(-f),
        NumericValue::Double(d) => NumericValue::Double(-d),
    }
}

fn abs(v: NumericValue) -> NumericValue {
    match v {
        NumericValue::Integer(i) => NumericValue::Integer(i.abs()),
        NumericValue::Decimal(u, s) => NumericValue::Decimal(u.abs(), s),
        NumericValue::Float(f) => NumericValue::Float(f.abs()),
        NumericValue::Double(d) => NumericValue::Double(d.abs()),
    }
}

fn rounded(v: NumericValue) -> NumericValue {
    match v {
        NumericValue::Integer(i) => NumericValue::Integer(i),
        other => NumericValue::Integer(BigInt::from(other.to_f64().round() as i64)),
    }
}

/// Promote two operands to the smaller-to-larger datatype chain
/// integer -> decimal -> float -> double (spec.md §4.5 "Outputs choose the
/// smallest promoting datatype of the inputs").
fn promoted_rank(a: &NumericValue, b: &NumericValue) -> literal::NumericRank {
    a.rank().max(b.rank())
}

fn add(a: NumericValue, b: NumericValue) -> NumericValue {
    match promoted_rank(&a, &b) {
        literal::NumericRank::Integer => {
            NumericValue::Integer(as_bigint(&a) + as_bigint(&b))
        }
        literal::NumericRank::Decimal => decimal_op(&a, &b, |x, y| x + y),
        literal::NumericRank::Float => NumericValue::Float(a.to_f64() as f32 + b.to_f64() as f32),
        literal::NumericRank::Double => NumericValue::Double(a.to_f64() + b.to_f64()),
    }
}

fn mul(a: NumericValue, b: NumericValue) -> NumericValue {
    match promoted_rank(&a, &b) {
        literal::NumericRank::Integer => NumericValue::Integer(as_bigint(&a) * as_bigint(&b)),
        literal::NumericRank::Decimal => {
            let (au, asc) = as_scaled(&a);
            let (bu, bsc) = as_scaled(&b);
            NumericValue::Decimal(au * bu, asc + bsc)
        }
        literal::NumericRank::Float => NumericValue::Float(a.to_f64() as f32 * b.to_f64() as f32),
        literal::NumericRank::Double => NumericValue::Double(a.to_f64() * b.to_f64()),
    }
}

fn subtract(a: NumericValue, b: NumericValue) -> Option<NumericValue> {
    Some(add(a, negate(b)))
}

fn divide(a: NumericValue, b: NumericValue) -> Option<NumericValue> {
    if b.to_f64() == 0.0 {
        return None;
    }
    match promoted_rank(&a, &b) {
        literal::NumericRank::Integer | literal::NumericRank::Decimal => {
            Some(NumericValue::Double(a.to_f64() / b.to_f64()))
        }
        literal::NumericRank::Float => Some(NumericValue::Float(a.to_f64() as f32 / b.to_f64() as f32)),
        literal::NumericRank::Double => Some(NumericValue::Double(a.to_f64() / b.to_f64())),
    }
}

fn power(a: NumericValue, b: NumericValue) -> Option<NumericValue> {
    Some(NumericValue::Double(a.to_f64().powf(b.to_f64())))
}

fn remainder(a: NumericValue, b: NumericValue) -> Option<NumericValue> {
    if let (NumericValue::Integer(x), NumericValue::Integer(y)) = (&a, &b) {
        if y.sign() == num_bigint::Sign::NoSign {
            return None;
        }
        return Some(NumericValue::Integer(x % y));
    }
    if b.to_f64() == 0.0 {
        return None;
    }
    Some(NumericValue::Double(a.to_f64() % b.to_f64()))
}

fn integer_quotient(a: NumericValue, b: NumericValue) -> Option<NumericValue> {
    let bi = as_bigint_truncated(&b);
    if bi.sign() == num_bigint::Sign::NoSign {
        return None;
    }
    Some(NumericValue::Integer(as_bigint_truncated(&a) / bi))
}

fn as_bigint(v: &NumericValue) -> BigInt {
    match v {
        NumericValue::Integer(i) => i.clone(),
        other => as_bigint_truncated(other),
    }
}

fn pow10(exp: u32) -> BigInt {
    let mut acc = BigInt::from(1);
    let ten = BigInt::from(10);
    for _ in 0..exp {
        acc *= &ten;
    }
    acc
}

fn as_bigint_truncated(v: &NumericValue) -> BigInt {
    match v {
        NumericValue::Integer(i) => i.clone(),
        NumericValue::Decimal(u, s) => u / pow10(*s),
        other => BigInt::from(other.to_f64().trunc() as i64),
    }
}

fn as_scaled(v: &NumericValue) -> (BigInt, u32) {
    match v {
        NumericValue::Integer(i) => (i.clone(), 0),
        NumericValue::Decimal(u, s) => (u.clone(), *s),
        other => {
            // Float/decimal promotion path is double-based already by the
            // time we'd reach here (promoted_rank never picks Decimal when
            // either operand is float/double).
            (BigInt::from((other.to_f64() * 1_000_000.0).round() as i64), 6)
        }
    }
}

fn decimal_op(a: &NumericValue, b: &NumericValue, f: impl Fn(BigInt, BigInt) -> BigInt) -> NumericValue {
    let (au, asc) = as_scaled(a);
    let (bu, bsc) = as_scaled(b);
    let scale = asc.max(bsc);
    let au = au * pow10(scale - asc);
    let bu = bu * pow10(scale - bsc);
    NumericValue::Decimal(f(au, bu), scale)
}

fn term_numeric(engine: &Engine, t: &Term) -> Option<NumericValue> {
    match t {
        Term::Literal(lit) => {
            let lex = engine.run.interner.resolve(lit.lexical);
            let dt = literal::datatype_str(&engine.run.interner, lit);
            literal::parse_numeric(lex, dt)
        }
        _ => None,
    }
}

fn numeric_term(engine: &mut Engine, v: &NumericValue) -> Term {
    let lexical = literal::format_numeric(v);
    let dt = match v {
        NumericValue::Integer(_) => literal::XSD_INTEGER,
        NumericValue::Decimal(..) => literal::XSD_DECIMAL,
        NumericValue::Float(_) => literal::XSD_FLOAT,
        NumericValue::Double(_) => literal::XSD_DOUBLE,
    };
    Term::typed_literal(&mut engine.run.interner, &lexical, dt)
}

fn compare(engine: &Engine, goal: &Triple, op: &str) -> Vec<Substitution> {
    let (Some(a), Some(b)) = (term_numeric(engine, &goal.subject), term_numeric(engine, &goal.object))
    else {
        return Vec::new();
    };
    let x = a.to_f64();
    let y = b.to_f64();
    let ok = match op {
        "equalTo" => x == y,
        "notEqualTo" => x != y,
        "lessThan" => x < y,
        "notLessThan" => x >= y,
        "greaterThan" => x > y,
        "notGreaterThan" => x <= y,
        _ => false,
    };
    if ok {
        vec![Substitution::empty()]
    } else {
        Vec::new()
    }
}

fn unary(engine: &mut Engine, goal: &Triple, f: impl Fn(NumericValue) -> Option<NumericValue>) -> Vec<Substitution> {
    let Some(input) = term_numeric(engine, &goal.subject) else { return Vec::new() };
    let Some(result) = f(input) else { return Vec::new() };
    let value = numeric_term(engine, &result);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn unary_escape(
    engine: &mut Engine,
    goal: &Triple,
    local: &str,
    f: impl Fn(NumericValue) -> Option<NumericValue>,
) -> Vec<Substitution> {
    match term_numeric(engine, &goal.subject) {
        Some(input) => unary(engine, goal, move |_| f(input.clone())),
        None => {
            if UNARY_ESCAPE.contains(&local) && goal.subject.is_variable() && goal.object.is_variable() {
                vec![Substitution::empty()]
            } else {
                Vec::new()
            }
        }
    }
}

fn binary(
    engine: &mut Engine,
    goal: &Triple,
    f: impl Fn(NumericValue, NumericValue) -> Option<NumericValue>,
) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let (Some(a), Some(b)) = (term_numeric(engine, &items[0]), term_numeric(engine, &items[1])) else {
        return Vec::new();
    };
    let Some(result) = f(a, b) else { return Vec::new() };
    let value = numeric_term(engine, &result);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// Binary op bidirectional where meaningful (spec.md §4.5): if the object
/// is bound and exactly one subject-list element is unbound, solve for it.
fn binary_bidi(
    engine: &mut Engine,
    goal: &Triple,
    forward: impl Fn(NumericValue, NumericValue) -> Option<NumericValue>,
) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let a = term_numeric(engine, &items[0]);
    let b = term_numeric(engine, &items[1]);
    let result = term_numeric(engine, &goal.object);

    match (a, b, result) {
        (Some(a), Some(b), _) => binary(engine, goal, move |_, _| forward(a.clone(), b.clone())),
        (Some(a), None, Some(r)) => {
            // r = a - b  =>  b = a - r
            let Some(b) = subtract(a, r) else { return Vec::new() };
            let value = numeric_term(engine, &b);
            bind_or_check(&items[1], value, &engine.run.interner).into_iter().collect()
        }
        (None, Some(b), Some(r)) => {
            // r = a - b  =>  a = r + b
            let a = add(r, b);
            let value = numeric_term(engine, &a);
            bind_or_check(&items[0], value, &engine.run.interner).into_iter().collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReasonerConfig, RunState};
    use std::rc::Rc;

    fn fresh_engine() -> Engine {
        Engine::new(RunState::new(ReasonerConfig::default()))
    }

    #[test]
    fn sum_of_integers() {
        let mut e = fresh_engine();
        let a = Term::typed_literal(&mut e.run.interner, "2", literal::XSD_INTEGER);
        let b = Term::typed_literal(&mut e.run.interner, "3", literal::XSD_INTEGER);
        let list = Term::List(Rc::new(vec![a, b]));
        let out_var = Term::variable(&mut e.run.interner, "o");
        let goal = Triple::new(list, Term::iri(&mut e.run.interner, "x"), out_var);
        let out = fold_list(&mut e, &goal, add);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn comparison_rejects_non_numeric() {
        let mut e = fresh_engine();
        let a = Term::iri(&mut e.run.interner, "a");
        let b = Term::iri(&mut e.run.interner, "b");
        let goal = Triple::new(a, Term::iri(&mut e.run.interner, "x"), b);
        assert!(compare(&e, &goal, "equalTo").is_empty());
    }

    #[test]
    fn decimal_addition_preserves_scale() {
        let mut e = fresh_engine();
        let a = Term::typed_literal(&mut e.run.interner, "1.50", literal::XSD_DECIMAL);
        let b = Term::typed_literal(&mut e.run.interner, "2.25", literal::XSD_DECIMAL);
        let va = term_numeric(&e, &a).unwrap();
        let vb = term_numeric(&e, &b).unwrap();
        let sum = add(va, vb);
        assert_eq!(literal::format_numeric(&sum), "3.75");
    }
}

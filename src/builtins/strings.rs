//! `string:*` (spec.md §4.5 Strings).

use regex::Regex;

use super::bind_or_check;
use crate::engine::Engine;
use crate::literal;
use crate::subst::Substitution;
use crate::term::Term;
use crate::triple::Triple;

pub const KNOWN: &[&str] = &[
    "concatenation",
    "format",
    "contains",
    "notContains",
    "containsIgnoringCase",
    "startsWith",
    "endsWith",
    "equalIgnoringCase",
    "matches",
    "notMatches",
    "replace",
    "scrape",
    "length",
    "lowerCase",
    "upperCase",
];

pub fn eval(engine: &mut Engine, goal: &Triple, local: &str) -> Vec<Substitution> {
    match local {
        "concatenation" => concatenation(engine, goal),
        "format" => format_builtin(engine, goal),
        "contains" => contains(engine, goal, false, false),
        "notContains" => contains(engine, goal, false, true),
        "containsIgnoringCase" => contains(engine, goal, true, false),
        "startsWith" => edge(engine, goal, |h, n| h.starts_with(n)),
        "endsWith" => edge(engine, goal, |h, n| h.ends_with(n)),
        "equalIgnoringCase" => equal_ignoring_case(engine, goal),
        "matches" => matches(engine, goal, false),
        "notMatches" => matches(engine, goal, true),
        "replace" => replace(engine, goal),
        "scrape" => scrape(engine, goal),
        "length" => length(engine, goal),
        "lowerCase" => case(engine, goal, str::to_lowercase),
        "upperCase" => case(engine, goal, str::to_uppercase),
        _ => Vec::new(),
    }
}

fn lexical(engine: &Engine, t: &Term) -> Option<String> {
    match t {
        Term::Literal(lit) => Some(engine.run.interner.resolve(lit.lexical).to_string()),
        _ => None,
    }
}

fn string_literal(engine: &mut Engine, s: &str) -> Term {
    Term::typed_literal(&mut engine.run.interner, s, literal::XSD_STRING)
}

/// `string:concatenation`: n-ary, subject is a list of strings.
fn concatenation(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    let mut out = String::new();
    for item in &items {
        let Some(s) = lexical(engine, item) else { return Vec::new() };
        out.push_str(&s);
    }
    let value = string_literal(engine, &out);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// `string:format`: subject is `(template args...)`; only `%s` and `%%`
/// are recognized substitutions (spec.md §4.5 "only %s and %% supported").
fn format_builtin(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    let Some((template, args)) = items.split_first() else { return Vec::new() };
    let Some(template) = lexical(engine, template) else { return Vec::new() };
    let mut out = String::new();
    let mut arg_iter = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some('s') => {
                    chars.next();
                    let Some(arg) = arg_iter.next() else { return Vec::new() };
                    let Some(s) = lexical(engine, arg) else { return Vec::new() };
                    out.push_str(&s);
                }
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    let value = string_literal(engine, &out);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn contains(engine: &Engine, goal: &Triple, ignore_case: bool, negate: bool) -> Vec<Substitution> {
    let (Some(h), Some(n)) = (lexical(engine, &goal.subject), lexical(engine, &goal.object)) else {
        return Vec::new();
    };
    let found = if ignore_case {
        h.to_lowercase().contains(&n.to_lowercase())
    } else {
        h.contains(&n)
    };
    if found != negate {
        vec![Substitution::empty()]
    } else {
        Vec::new()
    }
}

fn edge(engine: &Engine, goal: &Triple, f: impl Fn(&str, &str) -> bool) -> Vec<Substitution> {
    let (Some(h), Some(n)) = (lexical(engine, &goal.subject), lexical(engine, &goal.object)) else {
        return Vec::new();
    };
    if f(&h, &n) { vec![Substitution::empty()] } else { Vec::new() }
}

fn equal_ignoring_case(engine: &Engine, goal: &Triple) -> Vec<Substitution> {
    let (Some(a), Some(b)) = (lexical(engine, &goal.subject), lexical(engine, &goal.object)) else {
        return Vec::new();
    };
    if a.to_lowercase() == b.to_lowercase() {
        vec![Substitution::empty()]
    } else {
        Vec::new()
    }
}

fn matches(engine: &Engine, goal: &Triple, negate: bool) -> Vec<Substitution> {
    let (Some(s), Some(pattern)) = (lexical(engine, &goal.subject), lexical(engine, &goal.object)) else {
        return Vec::new();
    };
    let Ok(re) = Regex::new(&pattern) else { return Vec::new() };
    let found = re.is_match(&s);
    if found != negate {
        vec![Substitution::empty()]
    } else {
        Vec::new()
    }
}

/// `string:replace`: subject is `(input pattern replacement)`.
fn replace(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 3 {
        return Vec::new();
    }
    let (Some(input), Some(pattern), Some(repl)) = (
        lexical(engine, &items[0]),
        lexical(engine, &items[1]),
        lexical(engine, &items[2]),
    ) else {
        return Vec::new();
    };
    let Ok(re) = Regex::new(&pattern) else { return Vec::new() };
    let out = re.replace_all(&input, repl.as_str()).into_owned();
    let value = string_literal(engine, &out);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// `string:scrape`: subject is `(input pattern)`, binds the first capture
/// (or whole match if no capture group).
fn scrape(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let (Some(input), Some(pattern)) = (lexical(engine, &items[0]), lexical(engine, &items[1])) else {
        return Vec::new();
    };
    let Ok(re) = Regex::new(&pattern) else { return Vec::new() };
    let Some(caps) = re.captures(&input) else { return Vec::new() };
    let matched = caps.get(1).or_else(|| caps.get(0));
    let Some(matched) = matched else { return Vec::new() };
    let value = string_literal(engine, matched.as_str());
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn length(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(s) = lexical(engine, &goal.subject) else { return Vec::new() };
    let value = Term::typed_literal(&mut engine.run.interner, &s.chars().count().to_string(), literal::XSD_INTEGER);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn case(engine: &mut Engine, goal: &Triple, f: impl Fn(&str) -> String) -> Vec<Substitution> {
    let Some(s) = lexical(engine, &goal.subject) else { return Vec::new() };
    let value = string_literal(engine, &f(&s));
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReasonerConfig, RunState};

    fn fresh_engine() -> Engine {
        Engine::new(RunState::new(ReasonerConfig::default()))
    }

    #[test]
    fn concatenation_joins_literals() {
        let mut e = fresh_engine();
        let a = string_literal(&mut e, "foo");
        let b = string_literal(&mut e, "bar");
        let list = Term::List(std::rc::Rc::new(vec![a, b]));
        let out_var = Term::variable(&mut e.run.interner, "o");
        let goal = Triple::new(list, Term::iri(&mut e.run.interner, "x"), out_var);
        let out = concatenation(&mut e, &goal);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn contains_is_case_sensitive_by_default() {
        let mut e = fresh_engine();
        let h = string_literal(&mut e, "HelloWorld");
        let n = string_literal(&mut e, "world");
        let goal = Triple::new(h, Term::iri(&mut e.run.interner, "x"), n);
        assert!(contains(&e, &goal, false, false).is_empty());
    }
}

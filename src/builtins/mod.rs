//! Built-in evaluator (spec.md §4.5).
//!
//! `eval` is the single dispatch point the prover calls for any goal whose
//! predicate resolves to a known `math:`/`list:`/`string:`/`crypto:`/
//! `log:`/`time:` IRI. Each sub-module owns one family; this file owns
//! recognition (`is_builtin`), the constraint-predicate allow-list used by
//! forward-rule premise reordering, and the shared "unify a computed value
//! into a goal position" helper every family uses to either bind an
//! unbound variable or check an already-bound one.

mod arithmetic;
mod crypto;
mod lists;
mod logb;
mod scoped;
mod strings;
mod timebuiltin;

use crate::engine::Engine;
use crate::subst::{Substitution, Trail};
use crate::term::{Interner, Term};
use crate::triple::Triple;
use crate::unify;

pub const MATH_NS: &str = "http://www.w3.org/2000/10/swap/math#";
pub const LIST_NS: &str = "http://www.w3.org/2000/10/swap/list#";
pub const STRING_NS: &str = "http://www.w3.org/2000/10/swap/string#";
pub const LOG_NS: &str = "http://www.w3.org/2000/10/swap/log#";
pub const CRYPTO_NS: &str = "http://www.w3.org/2000/10/swap/crypto#";
pub const TIME_NS: &str = "http://www.w3.org/2000/10/swap/time#";

/// Always-recognized regardless of super-restricted mode (spec.md §4.5
/// "A super-restricted mode disables every built-in except
/// log:implies/log:impliedBy").
const ALWAYS_ON: &[&str] = &["implies", "impliedBy"];

fn split_predicate<'a>(iri: &'a str) -> Option<(&'a str, &'a str)> {
    for ns in [MATH_NS, LIST_NS, STRING_NS, LOG_NS, CRYPTO_NS, TIME_NS] {
        if let Some(local) = iri.strip_prefix(ns) {
            return Some((ns, local));
        }
    }
    None
}

pub fn is_builtin(predicate: &Term, interner: &Interner, super_restricted: bool) -> bool {
    let Term::Iri(k) = predicate else { return false };
    let iri = interner.resolve(*k);
    let Some((ns, local)) = split_predicate(iri) else { return false };
    if super_restricted {
        return ns == LOG_NS && ALWAYS_ON.contains(&local);
    }
    known_local(ns, local)
}

fn known_local(ns: &str, local: &str) -> bool {
    match ns {
        MATH_NS => arithmetic::KNOWN.contains(&local),
        LIST_NS => lists::KNOWN.contains(&local),
        STRING_NS => strings::KNOWN.contains(&local),
        LOG_NS => logb::KNOWN.contains(&local),
        CRYPTO_NS => crypto::KNOWN.contains(&local),
        TIME_NS => timebuiltin::KNOWN.contains(&local),
        _ => false,
    }
}

/// `rdf:first`/`rdf:rest` goals are only treated as list built-ins when the
/// subject already resolved to a native `Term::List`/`OpenList` (spec.md
/// §4.4 step 1, §4.5 Lists); otherwise they fall through to ordinary
/// fact/rule resolution (a named list node's `rdf:first`/`rdf:rest` facts
/// were deliberately left untouched by the RDF-list materializer).
pub fn is_unapplicable_collection_accessor(goal: &Triple, interner: &Interner) -> bool {
    let Term::Iri(k) = &goal.predicate else { return false };
    let iri = interner.resolve(*k);
    if iri != crate::rdf_list::RDF_FIRST && iri != crate::rdf_list::RDF_REST {
        return false;
    }
    !matches!(goal.subject, Term::List(_) | Term::OpenList(_, _))
}

/// The hard-coded constraint-builtin allow-list (spec.md §9 Open
/// Questions): predicates that never produce new bindings, used by the
/// parser to move them to the end of a forward rule's premise list.
pub fn is_constraint_predicate(iri: &str) -> bool {
    matches!(
        iri,
        "http://www.w3.org/2000/10/swap/math#equalTo"
            | "http://www.w3.org/2000/10/swap/math#notEqualTo"
            | "http://www.w3.org/2000/10/swap/math#lessThan"
            | "http://www.w3.org/2000/10/swap/math#notLessThan"
            | "http://www.w3.org/2000/10/swap/math#greaterThan"
            | "http://www.w3.org/2000/10/swap/math#notGreaterThan"
            | "http://www.w3.org/2000/10/swap/log#equalTo"
            | "http://www.w3.org/2000/10/swap/log#notEqualTo"
            | "http://www.w3.org/2000/10/swap/log#notIncludes"
            | "http://www.w3.org/2000/10/swap/list#notMember"
            | "http://www.w3.org/2000/10/swap/string#notMatches"
            | "http://www.w3.org/2000/10/swap/string#notContains"
            | "http://www.w3.org/2000/10/swap/log#trace"
            | "http://www.w3.org/2000/10/swap/log#outputString"
    )
}

/// Dispatch a recognized builtin goal, returning each solution as a delta
/// substitution (spec.md §4.5 contract: "must treat goal arguments after σ;
/// must not mutate its inputs"). `goal` has already been fully resolved
/// through the caller's trail.
pub fn eval(
    engine: &mut Engine,
    goal: &Triple,
    trail: &mut Trail,
    max_results: Option<usize>,
) -> Vec<Substitution> {
    let Term::Iri(k) = &goal.predicate else { return Vec::new() };
    let iri = engine.run.interner.resolve(*k).to_string();
    let Some((ns, local)) = split_predicate(&iri) else { return Vec::new() };

    let mut out = match ns {
        MATH_NS => arithmetic::eval(engine, goal, local),
        LIST_NS => lists::eval(engine, goal, local),
        STRING_NS => strings::eval(engine, goal, local),
        LOG_NS => logb::eval(engine, goal, trail, local),
        CRYPTO_NS => crypto::eval(engine, goal, local),
        TIME_NS => timebuiltin::eval(engine, goal, local),
        _ => Vec::new(),
    };
    if let Some(cap) = max_results {
        out.truncate(cap.max(1));
    }
    out
}

/// Unify a computed value into a goal's term position, producing a delta
/// substitution (binds if the position is unbound, checks equivalence
/// otherwise). Shared by every builtin family.
pub fn bind_or_check(position: &Term, value: Term, interner: &Interner) -> Option<Substitution> {
    let mut trail = Trail::new();
    unify::unify(position, &value, &mut trail, interner).ok()?;
    let mut vars = Vec::new();
    position.collect_variables(&mut vars);
    value.collect_variables(&mut vars);
    Some(trail.snapshot(&vars))
}

pub fn list_items(term: &Term) -> Option<Vec<Term>> {
    match term {
        Term::List(items) => Some(items.as_ref().clone()),
        _ => None,
    }
}

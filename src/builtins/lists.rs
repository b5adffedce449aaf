//! `list:*` and the native-list-only `rdf:first`/`rdf:rest` accessors
//! (spec.md §4.5 Lists).

use std::rc::Rc;

use super::bind_or_check;
use crate::engine::Engine;
use crate::literal;
use crate::subst::{Substitution, Trail};
use crate::term::Term;
use crate::triple::Triple;

pub const KNOWN: &[&str] = &[
    "append", "first", "rest", "last", "memberAt", "member", "in", "length", "reverse",
    "sort", "map", "firstRest", "remove", "notMember", "iterate",
];

pub fn eval(engine: &mut Engine, goal: &Triple, local: &str) -> Vec<Substitution> {
    match local {
        "append" => append(engine, goal),
        "first" => nth(engine, goal, 0),
        "last" => last(engine, goal),
        "rest" => rest(engine, goal),
        "memberAt" => member_at(engine, goal),
        "member" | "in" => member(engine, goal),
        "notMember" => not_member(engine, goal),
        "length" => length(engine, goal),
        "reverse" => reverse(engine, goal),
        "sort" => sort(engine, goal),
        "firstRest" => first_rest(engine, goal),
        "remove" => remove(engine, goal),
        "map" => map_over(engine, goal),
        "iterate" => iterate(engine, goal),
        _ => Vec::new(),
    }
}

fn resolve_list(engine: &Engine, t: &Term) -> Option<Vec<Term>> {
    match t {
        Term::List(items) => Some(items.as_ref().clone()),
        _ => None,
    }
    .or_else(|| rdf_list_from_facts(engine, t))
}

/// Traverse a named list node through `rdf:first`/`rdf:rest` facts directly
/// (spec.md §4.5: "with a per-fact-set cache and cycle detection"). The
/// per-fact-set cache is the engine's fact index itself, which never
/// shrinks within a run, so no separate cache is needed beyond this
/// bounded walk.
fn rdf_list_from_facts(engine: &Engine, node: &Term) -> Option<Vec<Term>> {
    let first_iri = crate::rdf_list::RDF_FIRST;
    let rest_iri = crate::rdf_list::RDF_REST;
    let nil_iri = crate::rdf_list::RDF_NIL;
    let mut out = Vec::new();
    let mut current = node.clone();
    let mut seen = std::collections::HashSet::new();
    loop {
        if let Term::Iri(k) = &current {
            if engine.run.interner.resolve(*k) == nil_iri {
                return Some(out);
            }
        }
        let key = format!("{:?}", current);
        if !seen.insert(key) {
            return None; // cycle
        }
        let first = find_object(engine, &current, first_iri)?;
        let next = find_object(engine, &current, rest_iri)?;
        out.push(first);
        current = next;
    }
}

fn find_object(engine: &Engine, subject: &Term, predicate_iri: &str) -> Option<Term> {
    engine.facts.all().iter().find_map(|t| {
        if &t.subject == subject {
            if let Term::Iri(k) = &t.predicate {
                if engine.run.interner.resolve(*k) == predicate_iri {
                    return Some(t.object.clone());
                }
            }
        }
        None
    })
}

fn list_term(items: Vec<Term>) -> Term {
    Term::List(Rc::new(items))
}

fn nth(engine: &mut Engine, goal: &Triple, n: usize) -> Vec<Substitution> {
    let Some(items) = resolve_list(engine, &goal.subject) else { return Vec::new() };
    let Some(item) = items.get(n).cloned() else { return Vec::new() };
    bind_or_check(&goal.object, item, &engine.run.interner).into_iter().collect()
}

fn last(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = resolve_list(engine, &goal.subject) else { return Vec::new() };
    let Some(item) = items.last().cloned() else { return Vec::new() };
    bind_or_check(&goal.object, item, &engine.run.interner).into_iter().collect()
}

fn rest(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = resolve_list(engine, &goal.subject) else { return Vec::new() };
    if items.is_empty() {
        return Vec::new();
    }
    let tail = list_term(items[1..].to_vec());
    bind_or_check(&goal.object, tail, &engine.run.interner).into_iter().collect()
}

fn first_rest(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = resolve_list(engine, &goal.subject) else { return Vec::new() };
    if items.is_empty() {
        return Vec::new();
    }
    let pair = list_term(vec![items[0].clone(), list_term(items[1..].to_vec())]);
    bind_or_check(&goal.object, pair, &engine.run.interner).into_iter().collect()
}

fn member_at(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let (list_arg, index_arg) = (&items[0], &items[1]);
    let Some(list) = resolve_list(engine, list_arg) else { return Vec::new() };
    let Term::Literal(lit) = index_arg else { return Vec::new() };
    let lex = engine.run.interner.resolve(lit.lexical).to_string();
    let Ok(idx) = lex.trim().parse::<usize>() else { return Vec::new() };
    let Some(item) = list.get(idx.saturating_sub(1)).cloned() else { return Vec::new() };
    bind_or_check(&goal.object, item, &engine.run.interner).into_iter().collect()
}

fn member(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = resolve_list(engine, &goal.object) else { return Vec::new() };
    let mut out = Vec::new();
    for item in items {
        if let Some(delta) = bind_or_check(&goal.subject, item, &engine.run.interner) {
            out.push(delta);
        }
    }
    out
}

fn not_member(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    if member(engine, goal).is_empty() { vec![Substitution::empty()] } else { Vec::new() }
}

fn length(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = resolve_list(engine, &goal.subject) else { return Vec::new() };
    let value = Term::typed_literal(&mut engine.run.interner, &items.len().to_string(), literal::XSD_INTEGER);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn reverse(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(mut items) = resolve_list(engine, &goal.subject) else { return Vec::new() };
    items.reverse();
    bind_or_check(&goal.object, list_term(items), &engine.run.interner).into_iter().collect()
}

fn remove(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let Some(list) = resolve_list(engine, &items[0]) else { return Vec::new() };
    let target = &items[1];
    let filtered: Vec<Term> = list.into_iter().filter(|t| t != target).collect();
    bind_or_check(&goal.object, list_term(filtered), &engine.run.interner).into_iter().collect()
}

/// `list:sort` comparator (spec.md §9 Open Questions): numbers compare
/// numerically, everything else lexicographically by canonical text.
fn sort(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(mut items) = resolve_list(engine, &goal.subject) else { return Vec::new() };
    let interner = &engine.run.interner;
    items.sort_by(|a, b| compare_terms(a, b, interner));
    bind_or_check(&goal.object, list_term(items), &engine.run.interner).into_iter().collect()
}

fn compare_terms(a: &Term, b: &Term, interner: &crate::term::Interner) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    let numeric = |t: &Term| -> Option<literal::NumericValue> {
        match t {
            Term::Literal(lit) => {
                let lex = interner.resolve(lit.lexical);
                let dt = literal::datatype_str(interner, lit);
                literal::parse_numeric(lex, dt)
            }
            _ => None,
        }
    };
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x.to_f64().partial_cmp(&y.to_f64()).unwrap_or(Ordering::Equal),
        _ => canonical_text(a, interner).cmp(&canonical_text(b, interner)),
    }
}

fn canonical_text(t: &Term, interner: &crate::term::Interner) -> String {
    crate::skolem::canonical_encode(t, interner)
}

/// `list:append`: variadic in the general case, implemented here as binary
/// with split-enumeration when the result is ground and one side is
/// unbound (spec.md §4.5 "enumerating splits when the result is ground").
fn append(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(parts) = super::list_items(&goal.subject) else { return Vec::new() };
    let bound_parts: Vec<Option<Vec<Term>>> = parts.iter().map(|p| resolve_list(engine, p)).collect();

    if bound_parts.iter().all(Option::is_some) {
        let mut out = Vec::new();
        for p in bound_parts.into_iter().flatten() {
            out.extend(p);
        }
        return bind_or_check(&goal.object, list_term(out), &engine.run.interner).into_iter().collect();
    }

    // Enumerate two-way splits of a ground result when exactly the two
    // subject parts are unbound (the common `list:append` enumeration
    // case; spec.md §4.5).
    if parts.len() == 2 && bound_parts.iter().all(Option::is_none) {
        if let Some(result) = resolve_list(engine, &goal.object) {
            let mut out = Vec::new();
            for split in 0..=result.len() {
                let (left, right) = result.split_at(split);
                let mut delta = Substitution::empty();
                let Some(d1) = bind_or_check(&parts[0], list_term(left.to_vec()), &engine.run.interner) else { continue };
                let Some(combined) = delta.compose(&d1) else { continue };
                delta = combined;
                let Some(d2) = bind_or_check(&parts[1], list_term(right.to_vec()), &engine.run.interner) else { continue };
                if let Some(combined) = delta.compose(&d2) {
                    out.push(combined);
                }
            }
            return out;
        }
    }
    Vec::new()
}

/// `list:map`: subject is `(list predicateIri)`; applies the predicate as a
/// binary built-in relation to each element in turn and binds the object to
/// the list of results, failing the whole map if any element has no
/// solution (spec.md §4.5 "map/iterate"). The predicate must itself be a
/// recognized built-in, since there is no host-callback mechanism to invoke
/// an arbitrary rule per element here.
fn map_over(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let (list_arg, predicate) = (&items[0], &items[1]);
    if !matches!(predicate, Term::Iri(_)) {
        return Vec::new();
    }
    let Some(list) = resolve_list(engine, list_arg) else { return Vec::new() };
    let mut mapped = Vec::with_capacity(list.len());
    for item in list {
        let out_var = Term::variable(&mut engine.run.interner, "__list_map_out");
        let probe = Triple::new(item, predicate.clone(), out_var.clone());
        if !crate::builtins::is_builtin(&probe.predicate, &engine.run.interner, engine.run.config.super_restricted) {
            return Vec::new();
        }
        let mut trail = Trail::new();
        let Some(delta) = super::eval(engine, &probe, &mut trail, Some(1)).into_iter().next() else {
            return Vec::new();
        };
        mapped.push(delta.apply(&out_var));
    }
    bind_or_check(&goal.object, list_term(mapped), &engine.run.interner).into_iter().collect()
}

/// `list:iterate`: subject is `(list predicateIri)`; succeeds with the
/// object bound to `true` iff every element satisfies the predicate as a
/// binary built-in relation (spec.md §4.5 "map/iterate"), the per-element
/// analogue of `log:forAllIn`'s "every solution also satisfies" check.
fn iterate(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let (list_arg, predicate) = (&items[0], &items[1]);
    if !matches!(predicate, Term::Iri(_)) {
        return Vec::new();
    }
    let Some(list) = resolve_list(engine, list_arg) else { return Vec::new() };
    for item in list {
        if !probe_holds(engine, &item, predicate) {
            return Vec::new();
        }
    }
    let value = Term::typed_literal(&mut engine.run.interner, "true", literal::XSD_BOOLEAN);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn probe_holds(engine: &mut Engine, item: &Term, predicate: &Term) -> bool {
    let out_var = Term::variable(&mut engine.run.interner, "__list_iterate_out");
    let probe = Triple::new(item.clone(), predicate.clone(), out_var);
    if !crate::builtins::is_builtin(&probe.predicate, &engine.run.interner, engine.run.config.super_restricted) {
        return false;
    }
    let mut trail = Trail::new();
    !super::eval(engine, &probe, &mut trail, Some(1)).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReasonerConfig, RunState};
    use crate::term::Term;

    fn fresh_engine() -> Engine {
        Engine::new(RunState::new(ReasonerConfig::default()))
    }

    #[test]
    fn length_of_native_list() {
        let mut e = fresh_engine();
        let a = Term::iri(&mut e.run.interner, "a");
        let b = Term::iri(&mut e.run.interner, "b");
        let list = list_term(vec![a, b]);
        let n = Term::variable(&mut e.run.interner, "n");
        let goal = Triple::new(list, Term::iri(&mut e.run.interner, "x"), n.clone());
        let out = length(&mut e, &goal);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn sum_via_append_roundtrip() {
        let mut e = fresh_engine();
        let a = Term::iri(&mut e.run.interner, "a");
        let b = Term::iri(&mut e.run.interner, "b");
        let c = Term::iri(&mut e.run.interner, "c");
        let parts = list_term(vec![list_term(vec![a.clone()]), list_term(vec![b.clone(), c.clone()])]);
        let out_var = Term::variable(&mut e.run.interner, "o");
        let goal = Triple::new(parts, Term::iri(&mut e.run.interner, "x"), out_var);
        let out = append(&mut e, &goal);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn map_negates_each_number() {
        let mut e = fresh_engine();
        let one = Term::typed_literal(&mut e.run.interner, "1", literal::XSD_INTEGER);
        let two = Term::typed_literal(&mut e.run.interner, "2", literal::XSD_INTEGER);
        let list = list_term(vec![one, two]);
        let negation = Term::iri(&mut e.run.interner, "http://www.w3.org/2000/10/swap/math#negation");
        let subj = list_term(vec![list, negation]);
        let out_var = Term::variable(&mut e.run.interner, "o");
        let goal = Triple::new(subj, Term::iri(&mut e.run.interner, "x"), out_var);
        let out = map_over(&mut e, &goal);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn iterate_fails_when_one_element_has_no_solution() {
        let mut e = fresh_engine();
        let num = Term::typed_literal(&mut e.run.interner, "1", literal::XSD_INTEGER);
        let not_num = Term::iri(&mut e.run.interner, "not-a-number");
        let list = list_term(vec![num, not_num]);
        let negation = Term::iri(&mut e.run.interner, "http://www.w3.org/2000/10/swap/math#negation");
        let subj = list_term(vec![list, negation]);
        let out_var = Term::variable(&mut e.run.interner, "ok");
        let goal = Triple::new(subj, Term::iri(&mut e.run.interner, "x"), out_var);
        assert!(iterate(&mut e, &goal).is_empty());
    }
}

//! RDF-list materializer (spec.md §4.8).
//!
//! Runs once, before the first fact index is built: blank-node subjects
//! that head a well-formed `rdf:first`/`rdf:rest` cons chain are folded into
//! native `Term::List` values, and every triple/rule/formula in the
//! document is rewritten so those list nodes appear as lists rather than as
//! chains of triples. Named list nodes (IRIs) are deliberately left alone so
//! list built-ins can still traverse them through facts (spec.md §4.8).

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use lasso::Spur;

use crate::term::{Formula, Interner, Term};
use crate::triple::{Rule, Triple};

pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";

struct ConsEntry {
    first: Term,
    rest: Term,
}

/// Materialize RDF collections across the document's triples, forward
/// rules, and backward rules in one pass. Returns the rewritten triples.
pub fn materialize(
    triples: Vec<Triple>,
    forward_rules: &mut [Rule],
    backward_rules: &mut [Rule],
    interner: &mut Interner,
) -> Vec<Triple> {
    let first_k = interner.intern(RDF_FIRST);
    let rest_k = interner.intern(RDF_REST);
    let nil_k = interner.intern(RDF_NIL);

    let mut cons: HashMap<BlankKey, ConsEntry> = HashMap::new();
    let mut consumed = vec![false; triples.len()];

    for (idx, t) in triples.iter().enumerate() {
        let Term::Blank(subj) = &t.subject else { continue };
        if let Term::Iri(p) = &t.predicate {
            if *p == first_k {
                cons.entry(BlankKey(*subj)).or_insert_with(|| ConsEntry {
                    first: Term::Blank(*subj),
                    rest: Term::Blank(*subj),
                });
                cons.get_mut(&BlankKey(*subj)).unwrap().first = t.object.clone();
                consumed[idx] = true;
            } else if *p == rest_k {
                cons.entry(BlankKey(*subj)).or_insert_with(|| ConsEntry {
                    first: Term::Blank(*subj),
                    rest: Term::Blank(*subj),
                });
                cons.get_mut(&BlankKey(*subj)).unwrap().rest = t.object.clone();
                consumed[idx] = true;
            }
        }
    }

    // Which blank nodes are "roots" of a chain, i.e. not referenced as the
    // `rdf:rest` object of another cons cell (so the whole chain collapses
    // to a single List term at its root only).
    let referenced_as_rest: HashSet<BlankKey> = cons
        .values()
        .filter_map(|e| match &e.rest {
            Term::Blank(b) => Some(BlankKey(*b)),
            _ => None,
        })
        .collect();

    let mut resolved: HashMap<BlankKey, Term> = HashMap::new();
    for key in cons.keys() {
        if !referenced_as_rest.contains(key) {
            resolve_chain(*key, &cons, nil_k, &mut resolved, &mut HashSet::new());
        }
    }

    // Any triple belonging to a cons cell whose root failed to resolve
    // (cycle or incomplete chain) must be kept as-is (spec.md §4.8 "either
    // leaves the original triples in place").
    let mut rewritten: Vec<Triple> = Vec::new();
    for (idx, t) in triples.into_iter().enumerate() {
        if consumed[idx] {
            if let Term::Blank(subj) = &t.subject {
                if resolved.contains_key(&BlankKey(*subj)) {
                    continue; // this triple's whole chain became a list term
                }
            }
        }
        rewritten.push(rewrite_triple(&t, &resolved));
    }

    for r in forward_rules.iter_mut() {
        rewrite_rule(r, &resolved);
    }
    for r in backward_rules.iter_mut() {
        rewrite_rule(r, &resolved);
    }

    rewritten
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BlankKey(Spur);

fn resolve_chain(
    key: BlankKey,
    cons: &HashMap<BlankKey, ConsEntry>,
    nil_k: Spur,
    resolved: &mut HashMap<BlankKey, Term>,
    visiting: &mut HashSet<BlankKey>,
) -> Option<Term> {
    if let Some(existing) = resolved.get(&key) {
        return Some(existing.clone());
    }
    if !visiting.insert(key) {
        return None; // cycle: leave in place
    }
    let entry = cons.get(&key)?;
    let first = entry.first.clone();
    let rest_term = match &entry.rest {
        Term::Iri(k) if *k == nil_k => Some(Term::List(Rc::new(Vec::new()))),
        Term::Blank(b) => resolve_chain(BlankKey(*b), cons, nil_k, resolved, visiting),
        other => Some(other.clone()),
    };
    visiting.remove(&key);
    let rest_term = rest_term?;
    let list = match rest_term {
        Term::List(items) => {
            let mut v = Vec::with_capacity(items.len() + 1);
            v.push(first);
            v.extend(items.iter().cloned());
            Term::List(Rc::new(v))
        }
        other => {
            // Incomplete chain: tail isn't `rdf:nil` or another cons cell.
            // Treat the whole thing as unresolved.
            let _ = other;
            return None;
        }
    };
    resolved.insert(key, list.clone());
    Some(list)
}

fn rewrite_term(t: &Term, resolved: &HashMap<BlankKey, Term>) -> Term {
    match t {
        Term::Blank(b) => resolved.get(&BlankKey(*b)).cloned().unwrap_or_else(|| t.clone()),
        Term::List(items) => {
            Term::List(Rc::new(items.iter().map(|x| rewrite_term(x, resolved)).collect()))
        }
        Term::OpenList(items, tail) => {
            Term::OpenList(Rc::new(items.iter().map(|x| rewrite_term(x, resolved)).collect()), *tail)
        }
        Term::Formula(f) => Term::Formula(Rc::new(Formula {
            triples: f.triples.iter().map(|tr| rewrite_triple(tr, resolved)).collect(),
        })),
        Term::Iri(_) | Term::Literal(_) | Term::Variable(_) => t.clone(),
    }
}

fn rewrite_triple(t: &Triple, resolved: &HashMap<BlankKey, Term>) -> Triple {
    Triple {
        subject: rewrite_term(&t.subject, resolved),
        predicate: rewrite_term(&t.predicate, resolved),
        object: rewrite_term(&t.object, resolved),
    }
}

fn rewrite_rule(r: &mut Rule, resolved: &HashMap<BlankKey, Term>) {
    for t in r.premises.iter_mut().chain(r.conclusions.iter_mut()) {
        *t = rewrite_triple(t, resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_chain_collapses_to_list() {
        let mut i = Interner::new();
        let a = Term::iri(&mut i, "a");
        let b = Term::iri(&mut i, "b");
        let nil = Term::iri(&mut i, RDF_NIL);
        let root = Term::blank(&mut i, "L0");
        let tail = Term::blank(&mut i, "L1");

        let triples = vec![
            Triple::new(root.clone(), Term::iri(&mut i, RDF_FIRST), a.clone()),
            Triple::new(root.clone(), Term::iri(&mut i, RDF_REST), tail.clone()),
            Triple::new(tail.clone(), Term::iri(&mut i, RDF_FIRST), b.clone()),
            Triple::new(tail.clone(), Term::iri(&mut i, RDF_REST), nil),
            Triple::new(a.clone(), Term::iri(&mut i, "p"), root.clone()),
        ];
        let mut fwd = vec![];
        let mut bwd = vec![];
        let out = materialize(triples, &mut fwd, &mut bwd, &mut i);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].object, Term::List(Rc::new(vec![a, b])));
    }

    #[test]
    fn cyclic_chain_is_left_in_place() {
        let mut i = Interner::new();
        let x = Term::blank(&mut i, "X");
        let triples = vec![
            Triple::new(x.clone(), Term::iri(&mut i, RDF_FIRST), Term::iri(&mut i, "a")),
            Triple::new(x.clone(), Term::iri(&mut i, RDF_REST), x.clone()),
        ];
        let mut fwd = vec![];
        let mut bwd = vec![];
        let out = materialize(triples, &mut fwd, &mut bwd, &mut i);
        assert_eq!(out.len(), 2);
    }
}

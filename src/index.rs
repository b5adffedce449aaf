//! Fact and backward-rule indexes (spec.md §4.3).

use std::collections::{HashMap, HashSet};

use lasso::Spur;

use crate::term::Term;
use crate::triple::{Rule, Triple};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TermKey(Spur);

fn term_key(t: &Term) -> Option<TermKey> {
    match t {
        Term::Iri(k) => Some(TermKey(*k)),
        _ => None,
    }
}

/// Indexes an append-only fact array. Facts never leave the array once
/// added; the indexes only ever grow.
#[derive(Default, Clone)]
pub struct FactIndex {
    facts: Vec<Triple>,
    by_predicate: HashMap<TermKey, Vec<usize>>,
    by_pred_subject: HashMap<(TermKey, TermKey), Vec<usize>>,
    by_pred_object: HashMap<(TermKey, TermKey), Vec<usize>>,
    /// Fully-atomic ground triples' `(s, p, o)` interned keys, for O(1)
    /// duplicate detection (spec.md §4.3).
    atomic_dedup: HashSet<(TermKey, TermKey, TermKey)>,
}

impl FactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn all(&self) -> &[Triple] {
        &self.facts
    }

    /// Returns `true` if the triple was newly added (spec.md §8 "duplicate
    /// insertion is a no-op").
    pub fn insert(&mut self, triple: Triple) -> bool {
        if let (Some(s), Some(p), Some(o)) =
            (term_key(&triple.subject), term_key(&triple.predicate), term_key(&triple.object))
        {
            if !self.atomic_dedup.insert((s, p, o)) {
                return false;
            }
        } else if self.contains_linear(&triple) {
            return false;
        }

        let idx = self.facts.len();
        let pk = term_key(&triple.predicate);
        if let Some(pk) = pk {
            self.by_predicate.entry(pk).or_default().push(idx);
            if let Some(sk) = term_key(&triple.subject) {
                self.by_pred_subject.entry((pk, sk)).or_default().push(idx);
            }
            if let Some(ok) = term_key(&triple.object) {
                self.by_pred_object.entry((pk, ok)).or_default().push(idx);
            }
        }
        self.facts.push(triple);
        true
    }

    fn contains_linear(&self, triple: &Triple) -> bool {
        self.facts.iter().any(|t| t == triple)
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        if let (Some(s), Some(p), Some(o)) =
            (term_key(&triple.subject), term_key(&triple.predicate), term_key(&triple.object))
        {
            self.atomic_dedup.contains(&(s, p, o))
        } else {
            self.contains_linear(triple)
        }
    }

    /// Candidate facts for a goal triple, narrowed by whichever of
    /// `(p,s)`/`(p,o)` indexes apply, falling back to the full `p` bucket or
    /// a linear scan for non-IRI/unhashable predicates (spec.md §4.3).
    pub fn candidates(&self, goal: &Triple) -> Candidates<'_> {
        let pk = match term_key(&goal.predicate) {
            Some(pk) => pk,
            None => return Candidates::Linear(&self.facts),
        };
        let sk = term_key(&goal.subject);
        let ok = term_key(&goal.object);

        let ps_bucket = sk.and_then(|sk| self.by_pred_subject.get(&(pk, sk)));
        let po_bucket = ok.and_then(|ok| self.by_pred_object.get(&(pk, ok)));

        let chosen = match (ps_bucket, po_bucket) {
            (Some(a), Some(b)) => Some(if a.len() <= b.len() { a } else { b }),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => self.by_predicate.get(&pk),
        };

        match chosen {
            Some(idxs) => Candidates::Indexed(&self.facts, idxs),
            None => Candidates::Empty,
        }
    }
}

pub enum Candidates<'a> {
    Indexed(&'a [Triple], &'a [usize]),
    Linear(&'a [Triple]),
    Empty,
}

impl<'a> Candidates<'a> {
    pub fn iter(&'a self) -> Box<dyn Iterator<Item = &'a Triple> + 'a> {
        match self {
            Candidates::Indexed(facts, idxs) => Box::new(idxs.iter().map(move |&i| &facts[i])),
            Candidates::Linear(facts) => Box::new(facts.iter()),
            Candidates::Empty => Box::new(std::iter::empty()),
        }
    }
}

/// Indexes backward rules by head predicate (spec.md §4.3). Multi-head
/// rules and rules whose single head has a non-IRI predicate go into the
/// wildcard bucket, always scanned in addition to the indexed bucket.
#[derive(Default)]
pub struct RuleIndex {
    rules: Vec<Rule>,
    by_head_predicate: HashMap<TermKey, Vec<usize>>,
    wildcard: Vec<usize>,
}

impl RuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        let idx = self.rules.len();
        if rule.conclusions.len() == 1 {
            if let Some(pk) = term_key(&rule.conclusions[0].predicate) {
                self.by_head_predicate.entry(pk).or_default().push(idx);
                self.rules.push(rule);
                return;
            }
        }
        self.wildcard.push(idx);
        self.rules.push(rule);
    }

    pub fn all(&self) -> &[Rule] {
        &self.rules
    }

    pub fn candidates_for(&self, goal_predicate: &Term) -> Vec<&Rule> {
        let mut out = Vec::new();
        if let Some(pk) = term_key(goal_predicate) {
            if let Some(idxs) = self.by_head_predicate.get(&pk) {
                out.extend(idxs.iter().map(|&i| &self.rules[i]));
            }
        }
        out.extend(self.wildcard.iter().map(|&i| &self.rules[i]));
        out
    }
}

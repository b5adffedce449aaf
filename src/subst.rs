//! Substitution engine: two discipline layers (spec.md §4.2).
//!
//! `Substitution` is the plain persistent map used for delta composition by
//! built-ins (each built-in call returns a fresh set of new bindings which
//! the caller composes). `Trail` is the mutable-plus-undo-log structure the
//! prover descends/backtracks through; it shares the same underlying map but
//! never discards it, only unwinds it to a saved mark.

use std::collections::HashMap;
use std::rc::Rc;

use lasso::Spur;

use crate::term::Term;

/// An immutable-looking (but `Rc`-shared, cheaply cloned) binding map.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    bindings: Rc<HashMap<Spur, Term>>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self { bindings: Rc::new(HashMap::new()) }
    }

    pub fn get(&self, var: Spur) -> Option<&Term> {
        self.bindings.get(&var)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns a new substitution extended with `var -> term`, or `None` if
    /// `var` is already bound to something else (disagreement).
    pub fn extended(&self, var: Spur, term: Term) -> Option<Substitution> {
        if let Some(existing) = self.bindings.get(&var) {
            return if *existing == term { Some(self.clone()) } else { None };
        }
        let mut m = (*self.bindings).clone();
        m.insert(var, term);
        Some(Substitution { bindings: Rc::new(m) })
    }

    /// Compose two deltas: every binding in `other` is added to `self`,
    /// failing if any shared key disagrees (spec.md §4.2 "Delta
    /// composition").
    pub fn compose(&self, other: &Substitution) -> Option<Substitution> {
        let mut result = self.clone();
        for (k, v) in other.bindings.iter() {
            result = result.extended(*k, v.clone())?;
        }
        Some(result)
    }

    /// Fully resolve a term through this substitution, recursively chasing
    /// variable chains and rewriting inside lists/open-lists/formulas.
    pub fn apply(&self, term: &Term) -> Term {
        match term {
            Term::Variable(v) => match self.get(*v) {
                Some(bound) => self.apply(bound),
                None => term.clone(),
            },
            Term::List(items) => {
                Term::List(Rc::new(items.iter().map(|t| self.apply(t)).collect()))
            }
            Term::OpenList(items, tail) => {
                let resolved_tail = self.apply(&Term::Variable(*tail));
                let mut applied: Vec<Term> = items.iter().map(|t| self.apply(t)).collect();
                match resolved_tail {
                    Term::Variable(v) => Term::OpenList(Rc::new(applied), v),
                    Term::List(rest) => {
                        applied.extend(rest.iter().cloned());
                        Term::List(Rc::new(applied))
                    }
                    Term::OpenList(rest, rest_tail) => {
                        applied.extend(rest.iter().cloned());
                        Term::OpenList(Rc::new(applied), rest_tail)
                    }
                    other => {
                        // Tail bound to a non-list term: malformed, but keep
                        // going rather than panic; surfaces as a unify
                        // failure downstream.
                        applied.push(other);
                        Term::List(Rc::new(applied))
                    }
                }
            }
            Term::Formula(f) => {
                let triples = f
                    .triples
                    .iter()
                    .map(|t| crate::triple::Triple {
                        subject: self.apply(&t.subject),
                        predicate: self.apply(&t.predicate),
                        object: self.apply(&t.object),
                    })
                    .collect();
                Term::Formula(Rc::new(crate::term::Formula { triples }))
            }
            Term::Iri(_) | Term::Literal(_) | Term::Blank(_) => term.clone(),
        }
    }

    /// Project the substitution down to a set of "answer variables",
    /// dropping everything else (spec.md §4.4 "each returned σ is
    /// compact").
    pub fn project(&self, answer_vars: &[Spur]) -> Substitution {
        let mut result = Substitution::empty();
        for v in answer_vars {
            let resolved = self.apply(&Term::Variable(*v));
            result = result.extended(*v, resolved).expect("fresh key");
        }
        result
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Spur, &Term)> {
        self.bindings.iter()
    }

    pub fn apply_triple(&self, t: &crate::triple::Triple) -> crate::triple::Triple {
        crate::triple::Triple {
            subject: self.apply(&t.subject),
            predicate: self.apply(&t.predicate),
            object: self.apply(&t.object),
        }
    }
}

/// A mutable substitution plus an undo log of newly-bound variables, used
/// inside the prover's depth-first descent (spec.md §4.2 "Trailed binding").
pub struct Trail {
    map: HashMap<Spur, Term>,
    log: Vec<Spur>,
}

impl Trail {
    pub fn new() -> Self {
        Self { map: HashMap::new(), log: Vec::new() }
    }

    pub fn mark(&self) -> usize {
        self.log.len()
    }

    /// Unwind every binding recorded since `mark`, restoring the
    /// substitution exactly (spec.md §4.2).
    pub fn undo_to(&mut self, mark: usize) {
        while self.log.len() > mark {
            let v = self.log.pop().unwrap();
            self.map.remove(&v);
        }
    }

    pub fn get(&self, var: Spur) -> Option<&Term> {
        self.map.get(&var)
    }

    /// Bind a previously-unbound variable, pushing it onto the trail. Panics
    /// if `var` is already bound — callers must check `get` first (the
    /// unifier always does, as part of the occurs-check walk).
    pub fn bind(&mut self, var: Spur, term: Term) {
        debug_assert!(!self.map.contains_key(&var), "double bind without undo");
        self.map.insert(var, term);
        self.log.push(var);
    }

    pub fn apply(&self, term: &Term) -> Term {
        match term {
            Term::Variable(v) => match self.map.get(v) {
                Some(bound) => self.apply(bound),
                None => term.clone(),
            },
            Term::List(items) => {
                Term::List(Rc::new(items.iter().map(|t| self.apply(t)).collect()))
            }
            Term::OpenList(items, tail) => {
                let resolved_tail = self.apply(&Term::Variable(*tail));
                let mut applied: Vec<Term> = items.iter().map(|t| self.apply(t)).collect();
                match resolved_tail {
                    Term::Variable(v) => Term::OpenList(Rc::new(applied), v),
                    Term::List(rest) => {
                        applied.extend(rest.iter().cloned());
                        Term::List(Rc::new(applied))
                    }
                    Term::OpenList(rest, rest_tail) => {
                        applied.extend(rest.iter().cloned());
                        Term::OpenList(Rc::new(applied), rest_tail)
                    }
                    other => {
                        applied.push(other);
                        Term::List(Rc::new(applied))
                    }
                }
            }
            Term::Formula(f) => {
                let triples = f
                    .triples
                    .iter()
                    .map(|t| crate::triple::Triple {
                        subject: self.apply(&t.subject),
                        predicate: self.apply(&t.predicate),
                        object: self.apply(&t.object),
                    })
                    .collect();
                Term::Formula(Rc::new(crate::term::Formula { triples }))
            }
            Term::Iri(_) | Term::Literal(_) | Term::Blank(_) => term.clone(),
        }
    }

    pub fn apply_triple(&self, t: &crate::triple::Triple) -> crate::triple::Triple {
        crate::triple::Triple {
            subject: self.apply(&t.subject),
            predicate: self.apply(&t.predicate),
            object: self.apply(&t.object),
        }
    }

    /// Snapshot the current bindings as an immutable `Substitution`,
    /// projected to `answer_vars` (spec.md §4.4).
    pub fn snapshot(&self, answer_vars: &[Spur]) -> Substitution {
        let mut result = Substitution::empty();
        for v in answer_vars {
            let resolved = self.apply(&Term::Variable(*v));
            result = result.extended(*v, resolved).expect("fresh key");
        }
        result
    }

    /// Garbage-collect: drop bindings unreachable from `roots` (the
    /// remaining goal list plus the answer variables), bounding
    /// per-step substitution size on deep chains (spec.md §4.2). Only
    /// ever called between prover steps, never mid-unification.
    pub fn gc(&mut self, roots: &[Term], answer_vars: &[Spur]) {
        let mut reachable: std::collections::HashSet<Spur> = answer_vars.iter().copied().collect();
        let mut frontier: Vec<Spur> = reachable.iter().copied().collect();
        let mut seed = Vec::new();
        for r in roots {
            r.collect_variables(&mut seed);
        }
        frontier.extend(seed.iter().copied());
        reachable.extend(seed);
        while let Some(v) = frontier.pop() {
            if let Some(bound) = self.map.get(&v) {
                let mut vars = Vec::new();
                bound.collect_variables(&mut vars);
                for nv in vars {
                    if reachable.insert(nv) {
                        frontier.push(nv);
                    }
                }
            }
        }
        self.log.retain(|v| reachable.contains(v));
        self.map.retain(|k, _| reachable.contains(k));
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::new()
    }
}

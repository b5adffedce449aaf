//! Scope-sensitive `log:*` predicates (spec.md §4.7): `log:includes`,
//! `log:notIncludes`, `log:collectAllIn`, `log:forAllIn`.
//!
//! `log:collectAllIn(?list, ?templ, ?body, scope)` is represented as a goal
//! triple `(templ body scope) log:collectAllIn ?list`; `log:forAllIn(?where,
//! ?then, scope)` as `(where then) log:forAllIn scope`. Both carry a *scope*
//! argument gating which facts the body is checked against (spec.md §4.7):
//! an explicit formula is self-contained and evaluated immediately; a
//! positive integer N defers until the closure-level counter reaches N
//! against the frozen Phase-B snapshot; anything else (a variable) is
//! priority 1.
//!
//! Rule bodies proven against a scope do not get backward-rule expansion —
//! only direct fact matching plus builtin dispatch — a deliberate
//! simplification from the full prover, recorded in DESIGN.md.

use lasso::Spur;

use crate::engine::Engine;
use crate::subst::{Substitution, Trail};
use crate::term::{Formula, Term};
use crate::triple::Triple;
use crate::unify;

pub fn includes(engine: &mut Engine, goal: &Triple, negate: bool) -> Vec<Substitution> {
    let Term::Formula(container) = &goal.subject else { return Vec::new() };
    let Term::Formula(needle) = &goal.object else { return Vec::new() };

    let holds = needle.triples.iter().all(|t| triple_included(engine, container, t));

    if holds != negate {
        vec![Substitution::empty()]
    } else {
        Vec::new()
    }
}

fn triple_included(engine: &Engine, container: &Formula, needle: &Triple) -> bool {
    container.triples.iter().any(|c| {
        c == needle
            || unify::formulas_alpha_equal(
                &Formula { triples: vec![c.clone()] },
                &Formula { triples: vec![needle.clone()] },
                &engine.run.interner,
            )
    })
}

/// The current scope-priority level: `None` while Phase A has no snapshot,
/// `Some(level)` once Phase B has frozen one (spec.md §4.6).
fn current_level(engine: &Engine) -> Option<u32> {
    engine.snapshot.as_ref().map(|s| s.level)
}

enum Scope {
    /// Evaluate against exactly these triples, no external rules/facts.
    Explicit(Vec<Triple>),
    /// Evaluate against the frozen Phase-B snapshot's facts.
    Frozen(Vec<Triple>),
}

/// Resolves a scope argument to a fact set, or `None` if the gate has not
/// opened yet (spec.md §4.7).
fn resolve_scope(engine: &Engine, scope: &Term) -> Option<Scope> {
    match scope {
        Term::Formula(f) => Some(Scope::Explicit(f.triples.clone())),
        Term::Literal(lit) => {
            let lex = engine.run.interner.resolve(lit.lexical);
            let n: u32 = lex.trim().parse().ok()?;
            let level = current_level(engine)?;
            if level >= n.max(1) {
                Some(Scope::Frozen(engine.snapshot.as_ref()?.facts.all().to_vec()))
            } else {
                None
            }
        }
        _ => {
            let level = current_level(engine)?;
            if level >= 1 {
                Some(Scope::Frozen(engine.snapshot.as_ref()?.facts.all().to_vec()))
            } else {
                None
            }
        }
    }
}

/// Proves a conjunction of goals against a fixed, owned fact set, with
/// builtin dispatch but no backward-rule expansion (see module doc).
fn solve_in_scope(
    engine: &mut Engine,
    goals: &[Triple],
    facts: &[Triple],
    trail: &mut Trail,
    answer_vars: &[Spur],
    out: &mut Vec<Substitution>,
) {
    let Some((goal, rest)) = goals.split_first() else {
        out.push(trail.snapshot(answer_vars));
        return;
    };
    let applied = trail.apply_triple(goal);

    if crate::builtins::is_builtin(&applied.predicate, &engine.run.interner, engine.run.config.super_restricted) {
        let deltas = crate::builtins::eval(engine, &applied, trail, None);
        for delta in deltas {
            let mark = trail.mark();
            let mut ok = true;
            for (var, term) in delta.iter() {
                if let Some(existing) = trail.get(*var) {
                    if existing.clone() != *term {
                        ok = false;
                        break;
                    }
                } else {
                    trail.bind(*var, term.clone());
                }
            }
            if ok {
                solve_in_scope(engine, rest, facts, trail, answer_vars, out);
            }
            trail.undo_to(mark);
        }
        return;
    }

    for fact in facts {
        let mark = trail.mark();
        if unify::unify(&fact.subject, &applied.subject, trail, &engine.run.interner).is_ok()
            && unify::unify(&fact.predicate, &applied.predicate, trail, &engine.run.interner).is_ok()
            && unify::unify(&fact.object, &applied.object, trail, &engine.run.interner).is_ok()
        {
            solve_in_scope(engine, rest, facts, trail, answer_vars, out);
        }
        trail.undo_to(mark);
    }
}

fn prove_in_scope(engine: &mut Engine, goals: &[Triple], scope_facts: &[Triple], answer_vars: &[Spur]) -> Vec<Substitution> {
    let mut trail = Trail::new();
    let mut out = Vec::new();
    solve_in_scope(engine, goals, scope_facts, &mut trail, answer_vars, &mut out);
    out
}

/// `(templ body scope) log:collectAllIn ?list`.
pub fn collect_all_in(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 3 {
        return Vec::new();
    }
    let (template, body_term, scope) = (&items[0], &items[1], &items[2]);
    let Term::Formula(body) = body_term else { return Vec::new() };
    let Some(scope_facts) = resolve_scope(engine, scope) else { return Vec::new() };
    let facts = match &scope_facts {
        Scope::Explicit(f) | Scope::Frozen(f) => f.clone(),
    };

    let mut vars = Vec::new();
    template.collect_variables(&mut vars);
    let goals: Vec<Triple> = body.triples.clone();
    let solutions = prove_in_scope(engine, &goals, &facts, &vars);

    let mut results: Vec<Term> = Vec::new();
    for sol in solutions {
        let instantiated = sol.apply(template);
        if !results.contains(&instantiated) {
            results.push(instantiated);
        }
    }
    let value = Term::List(std::rc::Rc::new(results));
    super::bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// `(whereFormula thenFormula) log:forAllIn scope`: succeeds when every
/// solution of `where` (in scope) also satisfies `then` (in scope).
pub fn for_all_in(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let (Term::Formula(where_f), Term::Formula(then_f)) = (&items[0], &items[1]) else { return Vec::new() };
    let Some(scope_facts) = resolve_scope(engine, &goal.object) else { return Vec::new() };
    let facts = match &scope_facts {
        Scope::Explicit(f) | Scope::Frozen(f) => f.clone(),
    };

    let mut vars = Vec::new();
    for t in &where_f.triples {
        t.collect_variables(&mut vars);
    }
    let where_goals: Vec<Triple> = where_f.triples.clone();
    let solutions = prove_in_scope(engine, &where_goals, &facts, &vars);

    for sol in solutions {
        let instantiated: Vec<Triple> = then_f
            .triples
            .iter()
            .map(|t| Triple::new(sol.apply(&t.subject), sol.apply(&t.predicate), sol.apply(&t.object)))
            .collect();
        if prove_in_scope(engine, &instantiated, &facts, &[]).is_empty() {
            return Vec::new();
        }
    }
    vec![Substitution::empty()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReasonerConfig, RunState};

    #[test]
    fn includes_matches_identical_triple() {
        let mut e = Engine::new(RunState::new(ReasonerConfig::default()));
        let s = Term::iri(&mut e.run.interner, "s");
        let p = Term::iri(&mut e.run.interner, "p");
        let o = Term::iri(&mut e.run.interner, "o");
        let t = Triple::new(s, p, o);
        let container = Term::Formula(std::rc::Rc::new(Formula { triples: vec![t.clone()] }));
        let needle = Term::Formula(std::rc::Rc::new(Formula { triples: vec![t] }));
        let goal = Triple::new(container, Term::iri(&mut e.run.interner, "x"), needle);
        assert_eq!(includes(&mut e, &goal, false).len(), 1);
    }

    #[test]
    fn collect_all_in_explicit_scope() {
        let mut e = Engine::new(RunState::new(ReasonerConfig::default()));
        let p = Term::iri(&mut e.run.interner, "p");
        let a = Term::iri(&mut e.run.interner, "a");
        let x = Term::variable(&mut e.run.interner, "x");
        let body = Formula { triples: vec![Triple::new(x.clone(), p.clone(), a.clone())] };
        let scope = Formula { triples: vec![Triple::new(a.clone(), p, a)] };
        let subj = Term::List(std::rc::Rc::new(vec![
            x,
            Term::Formula(std::rc::Rc::new(body)),
            Term::Formula(std::rc::Rc::new(scope)),
        ]));
        let out_var = Term::variable(&mut e.run.interner, "list");
        let goal = Triple::new(subj, Term::iri(&mut e.run.interner, "log:collectAllIn"), out_var);
        let out = collect_all_in(&mut e, &goal);
        assert_eq!(out.len(), 1);
    }
}

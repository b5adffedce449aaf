//! Backward SLD-style prover (spec.md §4.4).

use std::collections::VecDeque;

use lasso::Spur;

use crate::builtins;
use crate::engine::Engine;
use crate::subst::{Substitution, Trail};
use crate::triple::Triple;
use crate::unify;

#[derive(Debug, Clone, Copy)]
pub struct ProveOptions {
    pub defer_builtins: bool,
}

impl ProveOptions {
    pub fn no_defer() -> Self {
        Self { defer_builtins: false }
    }
    pub fn with_defer() -> Self {
        Self { defer_builtins: true }
    }
}

/// `prove(goals, σ, facts, rules, visited, maxResults?, opts?) -> σ[]`
/// (spec.md §4.4). `answer_vars` are the variables every returned
/// substitution is projected to.
pub fn prove(
    engine: &mut Engine,
    goals: Vec<Triple>,
    answer_vars: &[Spur],
    max_results: Option<usize>,
    opts: ProveOptions,
) -> Vec<Substitution> {
    let mut trail = Trail::new();
    let mut results = Vec::new();
    let mut visited: Vec<Triple> = Vec::new();
    let mut rename_counter: u64 = 0;
    let queue: VecDeque<Triple> = goals.into_iter().collect();
    solve(
        engine,
        queue,
        0,
        &mut trail,
        answer_vars,
        &mut visited,
        max_results,
        opts,
        &mut rename_counter,
        &mut results,
    );
    results
}

#[allow(clippy::too_many_arguments)]
fn solve(
    engine: &mut Engine,
    mut goals: VecDeque<Triple>,
    defer_count: usize,
    trail: &mut Trail,
    answer_vars: &[Spur],
    visited: &mut Vec<Triple>,
    max_results: Option<usize>,
    opts: ProveOptions,
    rename_counter: &mut u64,
    results: &mut Vec<Substitution>,
) {
    if let Some(cap) = max_results {
        if results.len() >= cap {
            return;
        }
    }

    let Some(goal) = goals.pop_front() else {
        results.push(trail.snapshot(answer_vars));
        return;
    };

    let applied = trail.apply_triple(&goal);
    let total_goals = goals.len() + 1;

    if builtins::is_builtin(&applied.predicate, &engine.run.interner, engine.run.config.super_restricted)
        && !builtins::is_unapplicable_collection_accessor(&applied, &engine.run.interner)
    {
        let remaining_cap = max_results.map(|c| c.saturating_sub(results.len()));
        let deltas = builtins::eval(engine, &applied, trail, remaining_cap);

        let vacuous = deltas.is_empty();
        let has_free_vars = {
            let mut vs = Vec::new();
            applied.collect_variables(&mut vs);
            !vs.is_empty()
        };

        if vacuous && opts.defer_builtins && has_free_vars && !goals.is_empty() && defer_count < total_goals {
            goals.push_back(goal);
            solve(
                engine,
                goals,
                defer_count + 1,
                trail,
                answer_vars,
                visited,
                max_results,
                opts,
                rename_counter,
                results,
            );
            return;
        }

        for delta in deltas {
            if let Some(cap) = max_results {
                if results.len() >= cap {
                    break;
                }
            }
            let mark = trail.mark();
            if apply_delta(trail, &delta) {
                solve(
                    engine,
                    goals.clone(),
                    0,
                    trail,
                    answer_vars,
                    visited,
                    max_results,
                    opts,
                    rename_counter,
                    results,
                );
            }
            trail.undo_to(mark);
        }
        return;
    }

    if visited.iter().any(|g| g == &applied) {
        return; // loop detection (spec.md §4.4 step 2)
    }
    visited.push(applied.clone());

    // Backward-rule expansion.
    let candidate_rule_ids: Vec<u64> = engine
        .backward_rules
        .candidates_for(&applied.predicate)
        .into_iter()
        .map(|r| r.id)
        .collect();
    for rule_id in candidate_rule_ids {
        if let Some(cap) = max_results {
            if results.len() >= cap {
                break;
            }
        }
        let rule = engine.backward_rules.all().iter().find(|r| r.id == rule_id).cloned();
        let Some(rule) = rule else { continue };
        if rule.conclusions.len() != 1 {
            continue;
        }
        *rename_counter += 1;
        let suffix = *rename_counter;
        let head = standardize_apart(&rule.conclusions[0], suffix, &mut engine.run.interner);
        let mark = trail.mark();
        if unify::unify_triple(&head, &applied, trail, &engine.run.interner, unify::UnifyOptions::general()).is_ok() {
            let mut new_goals: VecDeque<Triple> = rule
                .premises
                .iter()
                .map(|p| standardize_apart(p, suffix, &mut engine.run.interner))
                .collect();
            new_goals.extend(goals.iter().cloned());
            solve(
                engine,
                new_goals,
                0,
                trail,
                answer_vars,
                visited,
                max_results,
                ProveOptions::no_defer(),
                rename_counter,
                results,
            );
        }
        trail.undo_to(mark);
    }

    // Fact lookup.
    let fact_snapshot: Vec<Triple> = engine.facts.candidates(&applied).iter().cloned().collect();
    for fact in fact_snapshot {
        if let Some(cap) = max_results {
            if results.len() >= cap {
                break;
            }
        }
        let mark = trail.mark();
        if unify::unify(&fact.subject, &applied.subject, trail, &engine.run.interner).is_ok()
            && unify::unify(&fact.predicate, &applied.predicate, trail, &engine.run.interner).is_ok()
            && unify::unify(&fact.object, &applied.object, trail, &engine.run.interner).is_ok()
        {
            solve(
                engine,
                goals.clone(),
                0,
                trail,
                answer_vars,
                visited,
                max_results,
                opts,
                rename_counter,
                results,
            );
        }
        trail.undo_to(mark);
    }

    visited.pop();
}

fn apply_delta(trail: &mut Trail, delta: &Substitution) -> bool {
    for (var, term) in delta.iter() {
        if let Some(existing) = trail.get(*var) {
            if existing.clone() != *term {
                return false;
            }
            continue;
        }
        trail.bind(*var, term.clone());
    }
    true
}

/// Rename every variable (and head blank, inside a rule body standing in
/// for an existential) occurring in `t` by appending `_r{suffix}` to its
/// name, so each rule instance gets fresh variables (spec.md §4.4 step 3
/// "standardize variables apart").
pub fn standardize_apart(t: &Triple, suffix: u64, interner: &mut crate::term::Interner) -> Triple {
    Triple {
        subject: rename_term(&t.subject, suffix, interner),
        predicate: rename_term(&t.predicate, suffix, interner),
        object: rename_term(&t.object, suffix, interner),
    }
}

fn rename_term(t: &crate::term::Term, suffix: u64, interner: &mut crate::term::Interner) -> crate::term::Term {
    use crate::term::Term;
    match t {
        Term::Variable(v) => {
            let name = format!("{}_r{}", interner.resolve(*v), suffix);
            Term::Variable(interner.intern(&name))
        }
        Term::List(items) => {
            Term::List(std::rc::Rc::new(items.iter().map(|i| rename_term(i, suffix, interner)).collect()))
        }
        Term::OpenList(items, tail) => {
            let renamed: Vec<Term> = items.iter().map(|i| rename_term(i, suffix, interner)).collect();
            let tail_name = format!("{}_r{}", interner.resolve(*tail), suffix);
            Term::OpenList(std::rc::Rc::new(renamed), interner.intern(&tail_name))
        }
        Term::Formula(f) => {
            let triples = f.triples.iter().map(|tr| Triple {
                subject: rename_term(&tr.subject, suffix, interner),
                predicate: rename_term(&tr.predicate, suffix, interner),
                object: rename_term(&tr.object, suffix, interner),
            }).collect();
            Term::Formula(std::rc::Rc::new(crate::term::Formula { triples }))
        }
        Term::Iri(_) | Term::Literal(_) | Term::Blank(_) => t.clone(),
    }
}

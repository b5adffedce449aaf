//! Fixed-point forward chainer (spec.md §4.6).
//!
//! Each outer iteration runs Phase A (no snapshot; scoped builtins answering
//! to a snapshot fail outright) then, unless no scoped builtin occurs
//! anywhere in the rule set, Phase B (a frozen snapshot of the fact set at
//! an incrementing closure level). Both phases run the same inner
//! fixed-point: scan every forward rule, prove its body with builtin
//! deferral enabled, Skolemize head blanks per firing, promote any
//! `log:implies`/`log:impliedBy` head triple into a live rule, and detect
//! fuse.

use std::collections::{HashMap, HashSet};

use lasso::Spur;

use crate::builtins;
use crate::engine::{Engine, Snapshot};
use crate::error::ReasonStatus;
use crate::prover::{self, ProveOptions};
use crate::subst::Substitution;
use crate::term::{Formula, Term};
use crate::triple::{DerivedFact, Rule, RuleDirection, RuleKey};

pub fn saturate(engine: &mut Engine) -> ReasonStatus {
    let has_scoped = any_scoped_builtin(engine);
    let max_priority = if has_scoped { scan_max_priority(engine).max(1) } else { 0 };

    let mut settled: HashSet<u64> = HashSet::new();
    let mut promoted: HashSet<RuleKey> = engine
        .forward_rules
        .iter()
        .chain(engine.backward_rules.all().iter())
        .map(Rule::canonical_key)
        .collect();

    let mut level: u32 = 0;
    loop {
        engine.snapshot = None;
        let changed_a = run_inner_fixpoint(engine, &mut settled, &mut promoted);
        if engine.fuse_triggered {
            return ReasonStatus::Fuse;
        }

        if !has_scoped {
            if !changed_a {
                return ReasonStatus::Ok;
            }
            continue;
        }

        level += 1;
        engine.snapshot = Some(Snapshot { facts: engine.facts.clone(), level });
        let changed_b = run_inner_fixpoint(engine, &mut settled, &mut promoted);
        if engine.fuse_triggered {
            return ReasonStatus::Fuse;
        }

        if !changed_a && !changed_b && level >= max_priority {
            return ReasonStatus::Ok;
        }
    }
}

/// Runs forward rules to a local fixed point (no phase transition), as used
/// inside both Phase A and Phase B. Returns whether anything changed.
fn run_inner_fixpoint(engine: &mut Engine, settled: &mut HashSet<u64>, promoted: &mut HashSet<RuleKey>) -> bool {
    let mut any_change = false;
    loop {
        let rule_ids: Vec<u64> = engine.forward_rules.iter().map(|r| r.id).collect();
        let mut changed_this_pass = false;
        for rule_id in rule_ids {
            if engine.fuse_triggered {
                return true;
            }
            let Some(rule) = engine.forward_rules.iter().find(|r| r.id == rule_id).cloned() else { continue };
            if fire_rule(engine, &rule, settled, promoted) {
                changed_this_pass = true;
            }
        }
        if !changed_this_pass {
            break;
        }
        any_change = true;
    }
    any_change
}

fn fire_rule(engine: &mut Engine, rule: &Rule, settled: &mut HashSet<u64>, promoted: &mut HashSet<RuleKey>) -> bool {
    if settled.contains(&rule.id) {
        return false;
    }

    let strict_ground = rule.conclusions.iter().all(crate::triple::Triple::is_ground) && rule.head_blanks.is_empty();
    if strict_ground && rule.conclusions.iter().all(|c| engine.facts.contains(c)) {
        settled.insert(rule.id);
        return false;
    }

    let mut vars = Vec::new();
    for p in &rule.premises {
        p.collect_variables(&mut vars);
    }
    let solutions = prover::prove(engine, rule.premises.clone(), &vars, None, ProveOptions::with_defer());
    if solutions.is_empty() {
        return false;
    }

    let mut changed = false;
    for sol in &solutions {
        if rule.is_fuse {
            engine.fuse_triggered = true;
            return true;
        }
        if fire_once(engine, rule, sol, promoted) {
            changed = true;
        }
        if engine.fuse_triggered {
            return true;
        }
    }

    if strict_ground {
        settled.insert(rule.id);
    }
    changed
}

fn fire_once(engine: &mut Engine, rule: &Rule, sol: &Substitution, promoted: &mut HashSet<RuleKey>) -> bool {
    let firing_id = engine.run.fresh_rule_id();
    let mut blank_fresh: HashMap<Spur, Spur> = HashMap::new();
    for label in &rule.head_blanks {
        let label_str = engine.run.interner.resolve(*label).to_string();
        let fresh = engine.run.skolem.fresh_head_blank(firing_id, &label_str);
        blank_fresh.insert(*label, engine.run.interner.intern(&fresh));
    }

    let mut changed = false;
    for conclusion in &rule.conclusions {
        let instantiated = crate::triple::Triple {
            subject: instantiate(&conclusion.subject, sol, &blank_fresh),
            predicate: instantiate(&conclusion.predicate, sol, &blank_fresh),
            object: instantiate(&conclusion.object, sol, &blank_fresh),
        };

        maybe_promote(engine, &instantiated, promoted);

        if engine.facts.insert(instantiated.clone()) {
            changed = true;
            engine.record(DerivedFact {
                conclusion: instantiated,
                rule_id: rule.id,
                premise_instance: std::rc::Rc::new(rule.premises.iter().map(|p| sol.apply_triple(p)).collect()),
                substitution: sol.clone(),
            });
        }
    }
    changed
}

fn instantiate(t: &Term, sol: &Substitution, blank_fresh: &HashMap<Spur, Spur>) -> Term {
    rewrite_blanks(&sol.apply(t), blank_fresh)
}

fn rewrite_blanks(t: &Term, blank_fresh: &HashMap<Spur, Spur>) -> Term {
    match t {
        Term::Blank(k) => Term::Blank(*blank_fresh.get(k).unwrap_or(k)),
        Term::List(items) => {
            Term::List(std::rc::Rc::new(items.iter().map(|i| rewrite_blanks(i, blank_fresh)).collect()))
        }
        Term::OpenList(items, tail) => Term::OpenList(
            std::rc::Rc::new(items.iter().map(|i| rewrite_blanks(i, blank_fresh)).collect()),
            *tail,
        ),
        Term::Formula(f) => {
            let triples = f
                .triples
                .iter()
                .map(|tr| crate::triple::Triple {
                    subject: rewrite_blanks(&tr.subject, blank_fresh),
                    predicate: rewrite_blanks(&tr.predicate, blank_fresh),
                    object: rewrite_blanks(&tr.object, blank_fresh),
                })
                .collect();
            Term::Formula(std::rc::Rc::new(Formula { triples }))
        }
        other => other.clone(),
    }
}

const LOG_IMPLIES: &str = "http://www.w3.org/2000/10/swap/log#implies";
const LOG_IMPLIED_BY: &str = "http://www.w3.org/2000/10/swap/log#impliedBy";

/// Rule promotion (spec.md §4.6, §9): a derived triple shaped like
/// `{body} log:implies {head}` or `{head} log:impliedBy {body}` becomes a
/// live rule, deduplicated by its canonical structural key.
fn maybe_promote(engine: &mut Engine, triple: &crate::triple::Triple, promoted: &mut HashSet<RuleKey>) {
    let Term::Iri(pk) = &triple.predicate else { return };
    let predicate = engine.run.interner.resolve(*pk);
    let (premises, conclusions, direction) = match predicate {
        p if p == LOG_IMPLIES => {
            let (Term::Formula(body), Term::Formula(head)) = (&triple.subject, &triple.object) else { return };
            (body.triples.clone(), head.triples.clone(), RuleDirection::Forward)
        }
        p if p == LOG_IMPLIED_BY => {
            let (Term::Formula(head), Term::Formula(body)) = (&triple.subject, &triple.object) else { return };
            (body.triples.clone(), head.triples.clone(), RuleDirection::Backward)
        }
        _ => return,
    };

    let mut head_blanks = Vec::new();
    for c in &conclusions {
        let mut vs = Vec::new();
        c.collect_variables(&mut vs);
        let _ = vs; // head blanks proper are Term::Blank, not Term::Variable; promoted rules rarely carry fresh blanks of their own.
        collect_blanks(&c.subject, &mut head_blanks);
        collect_blanks(&c.predicate, &mut head_blanks);
        collect_blanks(&c.object, &mut head_blanks);
    }

    let id = engine.run.fresh_rule_id();
    let rule = Rule { premises, conclusions, direction, is_fuse: false, head_blanks, id };
    let key = rule.canonical_key();
    if !promoted.insert(key) {
        return;
    }
    match direction {
        RuleDirection::Forward => engine.forward_rules.push(rule),
        RuleDirection::Backward => engine.add_backward_rule(rule),
    }
}

pub(crate) fn collect_blanks(t: &Term, out: &mut Vec<Spur>) {
    match t {
        Term::Blank(k) => out.push(*k),
        Term::List(items) | Term::OpenList(items, _) => {
            for i in items.iter() {
                collect_blanks(i, out);
            }
        }
        Term::Formula(f) => {
            for tr in &f.triples {
                collect_blanks(&tr.subject, out);
                collect_blanks(&tr.predicate, out);
                collect_blanks(&tr.object, out);
            }
        }
        _ => {}
    }
}

const COLLECT_ALL_IN: &str = "http://www.w3.org/2000/10/swap/log#collectAllIn";
const FOR_ALL_IN: &str = "http://www.w3.org/2000/10/swap/log#forAllIn";
const INCLUDES: &str = "http://www.w3.org/2000/10/swap/log#includes";
const NOT_INCLUDES: &str = "http://www.w3.org/2000/10/swap/log#notIncludes";

fn any_scoped_builtin(engine: &Engine) -> bool {
    engine
        .forward_rules
        .iter()
        .flat_map(|r| r.premises.iter().chain(r.conclusions.iter()))
        .chain(engine.backward_rules.all().iter().flat_map(|r| r.premises.iter().chain(r.conclusions.iter())))
        .any(|t| triple_has_scoped(engine, t))
}

fn triple_has_scoped(engine: &Engine, t: &crate::triple::Triple) -> bool {
    if is_scoped_predicate(engine, &t.predicate) {
        return true;
    }
    term_has_scoped(engine, &t.subject) || term_has_scoped(engine, &t.object)
}

fn term_has_scoped(engine: &Engine, t: &Term) -> bool {
    match t {
        Term::Formula(f) => f.triples.iter().any(|tr| triple_has_scoped(engine, tr)),
        Term::List(items) | Term::OpenList(items, _) => items.iter().any(|i| term_has_scoped(engine, i)),
        _ => false,
    }
}

fn is_scoped_predicate(engine: &Engine, predicate: &Term) -> bool {
    let Term::Iri(k) = predicate else { return false };
    matches!(engine.run.interner.resolve(*k), COLLECT_ALL_IN | FOR_ALL_IN | INCLUDES | NOT_INCLUDES)
}

/// Scans every rule for the highest explicit integer scope priority
/// referenced by a scoped builtin (spec.md §4.6); variables imply priority
/// 1, an explicit formula contributes no gating requirement.
fn scan_max_priority(engine: &Engine) -> u32 {
    let mut max = 1;
    let triples = engine
        .forward_rules
        .iter()
        .flat_map(|r| r.premises.iter().chain(r.conclusions.iter()))
        .chain(engine.backward_rules.all().iter().flat_map(|r| r.premises.iter().chain(r.conclusions.iter())));
    for t in triples {
        scan_triple_priority(engine, t, &mut max);
    }
    max
}

fn scan_triple_priority(engine: &Engine, t: &crate::triple::Triple, max: &mut u32) {
    let Term::Iri(k) = &t.predicate else {
        scan_nested(engine, &t.subject, max);
        scan_nested(engine, &t.object, max);
        return;
    };
    let iri = engine.run.interner.resolve(*k);
    match iri {
        COLLECT_ALL_IN => {
            if let Some(items) = builtins::list_items(&t.subject) {
                if let Some(scope) = items.get(2) {
                    bump_priority(engine, scope, max);
                }
            }
        }
        FOR_ALL_IN => bump_priority(engine, &t.object, max),
        INCLUDES | NOT_INCLUDES => bump_priority(engine, &t.subject, max),
        _ => {}
    }
    scan_nested(engine, &t.subject, max);
    scan_nested(engine, &t.object, max);
}

fn scan_nested(engine: &Engine, t: &Term, max: &mut u32) {
    match t {
        Term::Formula(f) => {
            for tr in &f.triples {
                scan_triple_priority(engine, tr, max);
            }
        }
        Term::List(items) | Term::OpenList(items, _) => {
            for i in items.iter() {
                scan_nested(engine, i, max);
            }
        }
        _ => {}
    }
}

fn bump_priority(engine: &Engine, scope: &Term, max: &mut u32) {
    match scope {
        Term::Literal(lit) => {
            let lex = engine.run.interner.resolve(lit.lexical);
            if let Ok(n) = lex.trim().parse::<u32>() {
                *max = (*max).max(n);
            }
        }
        Term::Variable(_) => *max = (*max).max(1),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReasonerConfig, RunState};
    use crate::triple::Triple;

    fn fresh_engine() -> Engine {
        Engine::new(RunState::new(ReasonerConfig::default()))
    }

    #[test]
    fn transitive_closure_over_chain() {
        let mut e = fresh_engine();
        let r = Term::iri(&mut e.run.interner, "http://ex/r");
        let a = Term::iri(&mut e.run.interner, "http://ex/a");
        let b = Term::iri(&mut e.run.interner, "http://ex/b");
        let c = Term::iri(&mut e.run.interner, "http://ex/c");
        e.facts.insert(Triple::new(a.clone(), r.clone(), b.clone()));
        e.facts.insert(Triple::new(b.clone(), r.clone(), c.clone()));

        let x = Term::variable(&mut e.run.interner, "x");
        let y = Term::variable(&mut e.run.interner, "y");
        let z = Term::variable(&mut e.run.interner, "z");
        let rule = Rule {
            premises: vec![Triple::new(x.clone(), r.clone(), y.clone()), Triple::new(y, r.clone(), z.clone())],
            conclusions: vec![Triple::new(x, r.clone(), z)],
            direction: RuleDirection::Forward,
            is_fuse: false,
            head_blanks: Vec::new(),
            id: e.run.fresh_rule_id(),
        };
        e.forward_rules.push(rule);

        let status = saturate(&mut e);
        assert!(matches!(status, ReasonStatus::Ok));
        assert!(e.facts.contains(&Triple::new(a, r, c)));
    }

    #[test]
    fn fuse_rule_aborts_run() {
        let mut e = fresh_engine();
        let age = Term::iri(&mut e.run.interner, "http://ex/age");
        let a = Term::iri(&mut e.run.interner, "http://ex/a");
        let v = Term::typed_literal(&mut e.run.interner, "200", crate::literal::XSD_INTEGER);
        e.facts.insert(Triple::new(a, age.clone(), v));

        let x = Term::variable(&mut e.run.interner, "x");
        let vv = Term::variable(&mut e.run.interner, "v");
        let gt = Term::iri(&mut e.run.interner, "http://www.w3.org/2000/10/swap/math#greaterThan");
        let threshold = Term::typed_literal(&mut e.run.interner, "150", crate::literal::XSD_INTEGER);
        let rule = Rule {
            premises: vec![Triple::new(x, age, vv.clone()), Triple::new(vv, gt, threshold)],
            conclusions: Vec::new(),
            direction: RuleDirection::Forward,
            is_fuse: true,
            head_blanks: Vec::new(),
            id: e.run.fresh_rule_id(),
        };
        e.forward_rules.push(rule);

        let status = saturate(&mut e);
        assert!(matches!(status, ReasonStatus::Fuse));
    }
}

//! `log:*` (spec.md §4.5 Log, §4.7 Scoped predicates). Dispatch point for
//! everything in the `log:` namespace; the scope-sensitive members delegate
//! to `builtins::scoped`.

use super::{bind_or_check, scoped};
use crate::engine::Engine;
use crate::literal;
use crate::subst::{Substitution, Trail};
use crate::term::Term;
use crate::triple::Triple;
use crate::unify;

pub const KNOWN: &[&str] = &[
    "implies",
    "impliedBy",
    "conjunction",
    "equalTo",
    "notEqualTo",
    "includes",
    "notIncludes",
    "collectAllIn",
    "forAllIn",
    "conclusion",
    "content",
    "semantics",
    "semanticsOrError",
    "parsedAsN3",
    "rawType",
    "dtlit",
    "langlit",
    "uri",
    "skolem",
    "trace",
    "outputString",
];

pub fn eval(engine: &mut Engine, goal: &Triple, _trail: &mut Trail, local: &str) -> Vec<Substitution> {
    match local {
        "equalTo" => equal_to(engine, goal, false),
        "notEqualTo" => equal_to(engine, goal, true),
        "includes" => scoped::includes(engine, goal, false),
        "notIncludes" => scoped::includes(engine, goal, true),
        "collectAllIn" => scoped::collect_all_in(engine, goal),
        "forAllIn" => scoped::for_all_in(engine, goal),
        "conjunction" => conjunction(engine, goal),
        "conclusion" => conclusion(engine, goal),
        "uri" => uri(engine, goal),
        "rawType" => raw_type(engine, goal),
        "dtlit" => dtlit(engine, goal),
        "langlit" => langlit(engine, goal),
        "skolem" => skolem(engine, goal),
        "trace" => trace(engine, goal),
        "outputString" => output_string(engine, goal),
        "content" | "semantics" | "semanticsOrError" | "parsedAsN3" => {
            crate::deref::log_dereference(engine, goal, local)
        }
        "implies" => implies(engine, goal),
        "impliedBy" => implied_by(engine, goal),
        _ => Vec::new(),
    }
}

fn equal_to(engine: &Engine, goal: &Triple, negate: bool) -> Vec<Substitution> {
    let mut t = Trail::new();
    let unifies = unify::unify(&goal.subject, &goal.object, &mut t, &engine.run.interner).is_ok();
    if unifies != negate {
        vec![Substitution::empty()]
    } else {
        Vec::new()
    }
}

/// `log:implies`/`log:impliedBy` treat rules as queryable data (spec.md §4.5
/// "Dynamic predicates as data"): each rule in the store is standardized
/// apart and offered as a `{body} log:implies {head}` (or reversed,
/// `log:impliedBy`) solution, so `?r log:implies ?c` enumerates the
/// document's forward rules rather than failing outright.
fn implies(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let rules: Vec<(u64, Vec<Triple>, Vec<Triple>)> = engine
        .forward_rules
        .iter()
        .filter(|r| !r.is_fuse)
        .map(|r| (r.id, r.premises.clone(), r.conclusions.clone()))
        .collect();
    enumerate_rule_formulas(engine, goal, rules)
}

fn implied_by(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let rules: Vec<(u64, Vec<Triple>, Vec<Triple>)> = engine
        .backward_rules
        .all()
        .iter()
        .map(|r| (r.id, r.conclusions.clone(), r.premises.clone()))
        .collect();
    enumerate_rule_formulas(engine, goal, rules)
}

/// Standardizes each candidate rule apart (keyed by its own rule id, so
/// repeated enumeration is stable) and unifies `(first, second)` against the
/// goal's `(subject, object)`.
fn enumerate_rule_formulas(
    engine: &mut Engine,
    goal: &Triple,
    rules: Vec<(u64, Vec<Triple>, Vec<Triple>)>,
) -> Vec<Substitution> {
    let mut out = Vec::new();
    for (id, first, second) in rules {
        let first_r: Vec<Triple> = first
            .iter()
            .map(|t| crate::prover::standardize_apart(t, id, &mut engine.run.interner))
            .collect();
        let second_r: Vec<Triple> = second
            .iter()
            .map(|t| crate::prover::standardize_apart(t, id, &mut engine.run.interner))
            .collect();
        let first_f = Term::Formula(std::rc::Rc::new(crate::term::Formula { triples: first_r }));
        let second_f = Term::Formula(std::rc::Rc::new(crate::term::Formula { triples: second_r }));

        let mut trail = Trail::new();
        if unify::unify(&goal.subject, &first_f, &mut trail, &engine.run.interner).is_ok()
            && unify::unify(&goal.object, &second_f, &mut trail, &engine.run.interner).is_ok()
        {
            let mut vars = Vec::new();
            goal.subject.collect_variables(&mut vars);
            goal.object.collect_variables(&mut vars);
            out.push(trail.snapshot(&vars));
        }
    }
    out
}

/// `log:conjunction`: subject is a list of formulas, binds object to their
/// concatenated-triples formula.
fn conjunction(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    let mut triples = Vec::new();
    for item in &items {
        let Term::Formula(f) = item else { return Vec::new() };
        triples.extend(f.triples.iter().cloned());
    }
    let value = Term::Formula(std::rc::Rc::new(crate::term::Formula { triples }));
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// `log:conclusion`: given a formula (treated as a standalone document),
/// binds object to the formula of its forward-chained closure (spec.md
/// §4.5). The sub-reasoning borrows the caller's interner so Skolem IRIs
/// and term keys stay consistent with the surrounding document.
fn conclusion(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Term::Formula(f) = &goal.subject else { return Vec::new() };
    let mut sub_engine = Engine::new(crate::config::RunState::new(engine.run.config));
    std::mem::swap(&mut sub_engine.run.interner, &mut engine.run.interner);
    for t in &f.triples {
        sub_engine.facts.insert(t.clone());
    }
    crate::forward::saturate(&mut sub_engine);
    let result_triples: Vec<Triple> = sub_engine.facts.all().to_vec();
    std::mem::swap(&mut sub_engine.run.interner, &mut engine.run.interner);
    let value = Term::Formula(std::rc::Rc::new(crate::term::Formula { triples: result_triples }));
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn uri(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Term::Iri(k) = &goal.subject else { return Vec::new() };
    let text = engine.run.interner.resolve(*k).to_string();
    let value = Term::typed_literal(&mut engine.run.interner, &text, literal::XSD_STRING);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// `log:rawType`: binds the object to the IRI of the subject's datatype, or
/// to a sentinel class for IRIs/blanks/lists/formulas.
fn raw_type(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let type_iri = match &goal.subject {
        Term::Literal(lit) => {
            literal::datatype_str(&engine.run.interner, lit).unwrap_or(literal::XSD_STRING).to_string()
        }
        Term::Iri(_) => "http://www.w3.org/2000/01/rdf-schema#Resource".to_string(),
        Term::Blank(_) => "http://www.w3.org/2000/01/rdf-schema#Resource".to_string(),
        Term::List(_) | Term::OpenList(_, _) => "http://www.w3.org/1999/02/22-rdf-syntax-ns#List".to_string(),
        Term::Formula(_) => "http://www.w3.org/2000/10/swap/log#Formula".to_string(),
        Term::Variable(_) => return Vec::new(),
    };
    let value = Term::iri(&mut engine.run.interner, &type_iri);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// `log:dtlit`: subject is `(lexical datatypeIri)`, binds the object to the
/// typed literal.
fn dtlit(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let (Term::Literal(lex), Term::Iri(dt)) = (&items[0], &items[1]) else { return Vec::new() };
    let lexical = engine.run.interner.resolve(lex.lexical).to_string();
    let datatype = engine.run.interner.resolve(*dt).to_string();
    let value = Term::typed_literal(&mut engine.run.interner, &lexical, &datatype);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// `log:langlit`: subject is `(lexical langTag)`, binds the object to the
/// lang-tagged literal.
fn langlit(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let (Term::Literal(lex), Term::Literal(lang)) = (&items[0], &items[1]) else { return Vec::new() };
    let lexical = engine.run.interner.resolve(lex.lexical).to_string();
    let tag = engine.run.interner.resolve(lang.lexical).to_string();
    let value = Term::lang_literal(&mut engine.run.interner, &lexical, &tag);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn skolem(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let iri_text = engine.run.skolem.skolem_iri(&goal.subject, &engine.run.interner);
    let value = Term::iri(&mut engine.run.interner, &iri_text);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// `log:trace`: diagnostic side-effecting predicate (spec.md §4.5): logs
/// the subject's rendering via `tracing` and always succeeds.
fn trace(engine: &Engine, goal: &Triple) -> Vec<Substitution> {
    tracing::info!(term = %format_for_trace(engine, &goal.subject), "log:trace");
    vec![Substitution::empty()]
}

/// `log:outputString`: records the object's text for later ordered emission
/// (spec.md §6 "Ordering of log:outputString output") rather than printing
/// immediately, so `--strings` can sort by subject key.
fn output_string(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let text = match &goal.object {
        Term::Literal(lit) => engine.run.interner.resolve(lit.lexical).to_string(),
        other => crate::skolem::canonical_encode(other, &engine.run.interner),
    };
    engine.output_strings.push((goal.subject.clone(), text));
    vec![Substitution::empty()]
}

fn format_for_trace(engine: &Engine, t: &Term) -> String {
    crate::skolem::canonical_encode(t, &engine.run.interner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReasonerConfig, RunState};

    #[test]
    fn equal_to_same_iri() {
        let mut e = Engine::new(RunState::new(ReasonerConfig::default()));
        let a = Term::iri(&mut e.run.interner, "http://example/a");
        let b = Term::iri(&mut e.run.interner, "http://example/a");
        let goal = Triple::new(a, Term::iri(&mut e.run.interner, "x"), b);
        assert_eq!(equal_to(&e, &goal, false).len(), 1);
    }

    #[test]
    fn implies_enumerates_stored_forward_rules() {
        let mut e = Engine::new(RunState::new(ReasonerConfig::default()));
        let x = Term::variable(&mut e.run.interner, "x");
        let p = Term::iri(&mut e.run.interner, "http://example/p");
        let q = Term::iri(&mut e.run.interner, "http://example/q");
        e.forward_rules.push(crate::triple::Rule {
            premises: vec![Triple::new(x.clone(), p.clone(), x.clone())],
            conclusions: vec![Triple::new(x.clone(), q.clone(), x.clone())],
            direction: crate::triple::RuleDirection::Forward,
            is_fuse: false,
            head_blanks: Vec::new(),
            id: 1,
        });
        let body_var = Term::variable(&mut e.run.interner, "b");
        let head_var = Term::variable(&mut e.run.interner, "h");
        let goal = Triple::new(body_var, Term::iri(&mut e.run.interner, "log:implies"), head_var);
        assert_eq!(implies(&mut e, &goal).len(), 1);
    }
}

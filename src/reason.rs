//! Engine-to-host API (spec.md §6): `reason()` for a single document,
//! `run_files()` for the CLI's multi-file batch contract.

use std::collections::HashMap;

use crate::config::{ReasonerConfig, RunState};
use crate::engine::Engine;
use crate::error::{EyelingError, ReasonStatus};
use crate::term::Term;
use crate::triple::DerivedFact;

pub struct ReasonOptions {
    pub enforce_https: bool,
    pub proof: bool,
    pub include_input_facts_in_closure: bool,
    pub super_restricted: bool,
    pub deterministic_skolem: bool,
    pub max_results: Option<usize>,
}

impl Default for ReasonOptions {
    fn default() -> Self {
        Self {
            enforce_https: false,
            proof: false,
            include_input_facts_in_closure: true,
            super_restricted: false,
            deterministic_skolem: false,
            max_results: None,
        }
    }
}

pub struct ReasonOutput {
    pub prefixes: HashMap<String, String>,
    pub facts: Vec<crate::triple::Triple>,
    pub derived: Vec<DerivedFact>,
    pub closure_text: String,
    pub status: ReasonStatus,
    pub engine: Engine,
}

/// `reason(input_text, opts) -> { prefixes, facts, derived, closureText }`
/// (spec.md §6).
pub fn reason(input_text: &str, opts: ReasonOptions) -> Result<ReasonOutput, EyelingError> {
    let config = ReasonerConfig {
        enforce_https: opts.enforce_https,
        proof_comments: opts.proof,
        super_restricted: opts.super_restricted,
        deterministic_skolem: opts.deterministic_skolem,
        max_results: opts.max_results,
        include_input_facts_in_closure: opts.include_input_facts_in_closure,
    };
    let mut run = RunState::new(config);
    let doc = crate::parser::parse_document(input_text, &mut run)?;

    let mut forward_rules = doc.forward_rules;
    let mut engine = Engine::new(run);
    let mut backward_rules_vec = doc.backward_rules;
    let materialized = crate::rdf_list::materialize(
        doc.facts,
        &mut forward_rules,
        &mut backward_rules_vec,
        &mut engine.run.interner,
    );
    for r in backward_rules_vec {
        engine.add_backward_rule(r);
    }
    engine.forward_rules = forward_rules;

    for t in &materialized {
        engine.facts.insert(t.clone());
    }
    let input_fact_count = materialized.len();

    let status = crate::forward::saturate(&mut engine);

    let mut closure: Vec<crate::triple::Triple> = Vec::new();
    if opts.include_input_facts_in_closure {
        closure.extend(engine.facts.all().iter().cloned());
    } else {
        closure.extend(engine.facts.all().iter().skip(input_fact_count).cloned());
    }

    let env = crate::printer::PrefixEnv::new(doc.prefixes.clone().into_iter());
    let derived = engine.derivations.clone();
    let closure_text = if config.proof_comments {
        closure_text_with_proof(&closure, &derived, &env, &engine.run.interner)
    } else {
        crate::printer::print_closure(&closure, &env, &engine.run.interner)
    };

    Ok(ReasonOutput {
        prefixes: doc.prefixes,
        facts: closure,
        derived,
        closure_text,
        status,
        engine,
    })
}

fn triple_key(t: &crate::triple::Triple, interner: &crate::term::Interner) -> String {
    format!(
        "{}|{}|{}",
        crate::skolem::canonical_encode(&t.subject, interner),
        crate::skolem::canonical_encode(&t.predicate, interner),
        crate::skolem::canonical_encode(&t.object, interner)
    )
}

/// Renders the closure with a `# derived by rule N` comment above each
/// triple that a `DerivedFact` accounts for; input facts print bare.
fn closure_text_with_proof(
    closure: &[crate::triple::Triple],
    derived: &[DerivedFact],
    env: &crate::printer::PrefixEnv,
    interner: &crate::term::Interner,
) -> String {
    use std::fmt::Write as _;
    let mut by_conclusion: HashMap<String, &DerivedFact> = HashMap::new();
    for d in derived {
        by_conclusion.entry(triple_key(&d.conclusion, interner)).or_insert(d);
    }

    let mut out = String::new();
    for t in closure {
        if let Some(d) = by_conclusion.get(&triple_key(t, interner)) {
            let _ = writeln!(out, "# derived by rule {} from {} premise(s)", d.rule_id, d.premise_instance.len());
        }
        let _ = writeln!(out, "{} .", crate::printer::print_triple(t, env, interner));
    }
    out
}

/// `runFiles(files, opts) -> overall_status` (spec.md §6): `0` ok, `1` error
/// on at least one file, `2` contradiction/fuse seen. Per-file failures do
/// not abort the batch.
pub fn run_files(files: &[String], opts_template: impl Fn() -> ReasonOptions) -> i32 {
    let mut overall = 0;
    for path in files {
        let status = match std::fs::read_to_string(path) {
            Ok(text) => match reason(&text, opts_template()) {
                Ok(out) => out.status.exit_code(),
                Err(e) => {
                    tracing::warn!(file = %path, error = %e, "reasoning failed");
                    1
                }
            },
            Err(e) => {
                tracing::warn!(file = %path, error = %e, "failed to read file");
                1
            }
        };
        overall = overall.max(status);
    }
    overall
}

/// Sort key for `--strings` output ordering (spec.md §6 "Ordering of
/// log:outputString output"): numeric value first, then plain literal
/// lexical order, then IRI order, then blank-node label order, then the
/// canonical Skolem key; ties keep insertion order (a stable sort).
pub fn sorted_output_strings(engine: &mut Engine) -> Vec<String> {
    let indexed: Vec<(usize, Term, String)> =
        engine.output_strings.iter().cloned().enumerate().map(|(i, (k, s))| (i, k, s)).collect();
    let interner = &engine.run.interner;

    let mut ranked: Vec<(usize, Term, String)> = indexed;
    ranked.sort_by(|(ia, a, _), (ib, b, _)| cmp_keys(a, b, interner).then(ia.cmp(ib)));
    ranked.into_iter().map(|(_, _, s)| s).collect()
}

/// Class 0: numeric literals by value. Class 1: other plain/typed literals
/// by lexical order. Class 2: IRIs. Class 3: blank labels. Class 4:
/// everything else, by canonical Skolem key.
fn cmp_keys(a: &Term, b: &Term, interner: &crate::term::Interner) -> std::cmp::Ordering {
    key_class(a, interner).cmp(&key_class(b, interner)).then_with(|| {
        match (numeric_value(a, interner), numeric_value(b, interner)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            _ => key_text(a, interner).cmp(&key_text(b, interner)),
        }
    })
}

fn key_class(t: &Term, interner: &crate::term::Interner) -> u8 {
    match t {
        Term::Literal(_) if numeric_value(t, interner).is_some() => 0,
        Term::Literal(_) => 1,
        Term::Iri(_) => 2,
        Term::Blank(_) => 3,
        _ => 4,
    }
}

fn numeric_value(t: &Term, interner: &crate::term::Interner) -> Option<f64> {
    let Term::Literal(lit) = t else { return None };
    let lex = interner.resolve(lit.lexical);
    let dt = crate::literal::datatype_str(interner, lit);
    crate::literal::parse_numeric(lex, dt).map(|n| n.to_f64())
}

fn key_text(t: &Term, interner: &crate::term::Interner) -> String {
    match t {
        Term::Literal(lit) => interner.resolve(lit.lexical).to_string(),
        Term::Iri(k) | Term::Blank(k) | Term::Variable(k) => interner.resolve(*k).to_string(),
        _ => crate::skolem::canonical_encode(t, interner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_sort_by_value_not_lexical_order() {
        let mut engine = Engine::new(RunState::new(ReasonerConfig::default()));
        let nine = crate::term::Term::typed_literal(&mut engine.run.interner, "9", crate::literal::XSD_INTEGER);
        let ten = crate::term::Term::typed_literal(&mut engine.run.interner, "10", crate::literal::XSD_INTEGER);
        engine.output_strings.push((ten, "ten\n".to_string()));
        engine.output_strings.push((nine, "nine\n".to_string()));
        let out = sorted_output_strings(&mut engine);
        assert_eq!(out, vec!["nine\n".to_string(), "ten\n".to_string()]);
    }

    #[test]
    fn reason_over_simple_document_produces_closure_text() {
        let out = reason("@prefix : <http://ex/> .\n:a :p :b .", ReasonOptions::default()).unwrap();
        assert_eq!(out.facts.len(), 1);
        assert!(out.closure_text.contains(":p"));
    }
}

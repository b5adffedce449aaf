//! N3 pretty-printer (SPEC_FULL.md §4.11): renders a `Term`/`Triple`/closure
//! back to N3 text given a prefix environment, abbreviating `rdf:type` as
//! `a`, `owl:sameAs` as `=`, and rule triples as `=>`/`<=`.

use std::fmt::Write as _;

use crate::parser::{LOG_IMPLIED_BY_IRI, LOG_IMPLIES_IRI, OWL_SAME_AS_IRI, RDF_TYPE_IRI};
use crate::term::{LiteralSuffix, Term};
use crate::triple::Triple;

/// Maps full IRI strings back to `prefix:local`, longest-base-first so a
/// more specific prefix shadows a shorter one sharing a common root.
pub struct PrefixEnv {
    entries: Vec<(String, String)>,
}

impl PrefixEnv {
    pub fn new(prefixes: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut entries: Vec<(String, String)> = prefixes.into_iter().collect();
        entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        Self { entries }
    }

    fn abbreviate(&self, iri: &str) -> Option<String> {
        for (prefix, base) in &self.entries {
            if let Some(local) = iri.strip_prefix(base.as_str()) {
                if !local.is_empty() && local.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
                    return Some(format!("{prefix}:{local}"));
                }
            }
        }
        None
    }
}

pub fn print_term(t: &Term, env: &PrefixEnv, interner: &crate::term::Interner) -> String {
    match t {
        Term::Iri(k) => {
            let iri = interner.resolve(*k);
            env.abbreviate(iri).unwrap_or_else(|| format!("<{iri}>"))
        }
        Term::Literal(lit) => {
            let lex = interner.resolve(lit.lexical);
            match &lit.suffix {
                LiteralSuffix::Plain => format!("\"{}\"", escape(lex)),
                LiteralSuffix::Datatype(dt) => {
                    let dt_iri = interner.resolve(*dt);
                    let dt_text = env.abbreviate(dt_iri).unwrap_or_else(|| format!("<{dt_iri}>"));
                    format!("\"{}\"^^{}", escape(lex), dt_text)
                }
                LiteralSuffix::Lang(l) => format!("\"{}\"@{}", escape(lex), interner.resolve(*l)),
            }
        }
        Term::Blank(k) => format!("_:{}", interner.resolve(*k)),
        Term::Variable(k) => format!("?{}", interner.resolve(*k)),
        Term::List(items) => {
            let parts: Vec<String> = items.iter().map(|i| print_term(i, env, interner)).collect();
            format!("({})", parts.join(" "))
        }
        Term::OpenList(items, tail) => {
            let parts: Vec<String> = items.iter().map(|i| print_term(i, env, interner)).collect();
            format!("({} | ?{})", parts.join(" "), interner.resolve(*tail))
        }
        Term::Formula(f) => {
            let mut s = String::from("{ ");
            for tr in &f.triples {
                s.push_str(&print_triple(tr, env, interner));
                s.push_str(" . ");
            }
            s.push('}');
            s
        }
    }
}

/// Renders a triple as N3, recognizing `a`/`=`/`=>`/`<=` sugar.
pub fn print_triple(t: &Triple, env: &PrefixEnv, interner: &crate::term::Interner) -> String {
    let predicate_text = match &t.predicate {
        Term::Iri(k) => {
            let iri = interner.resolve(*k);
            match iri {
                RDF_TYPE_IRI => Some("a".to_string()),
                OWL_SAME_AS_IRI => Some("=".to_string()),
                LOG_IMPLIES_IRI => Some("=>".to_string()),
                LOG_IMPLIED_BY_IRI => Some("<=".to_string()),
                _ => None,
            }
        }
        _ => None,
    };
    let predicate_text = predicate_text.unwrap_or_else(|| print_term(&t.predicate, env, interner));
    format!(
        "{} {} {}",
        print_term(&t.subject, env, interner),
        predicate_text,
        print_term(&t.object, env, interner)
    )
}

pub fn print_closure(triples: &[Triple], env: &PrefixEnv, interner: &crate::term::Interner) -> String {
    let mut out = String::new();
    for t in triples {
        let _ = writeln!(out, "{} .", print_triple(t, env, interner));
    }
    out
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Interner;

    #[test]
    fn abbreviates_rdf_type_as_a() {
        let mut i = Interner::new();
        let s = Term::iri(&mut i, "http://ex/a");
        let p = Term::iri(&mut i, RDF_TYPE_IRI);
        let o = Term::iri(&mut i, "http://ex/Thing");
        let env = PrefixEnv::new([("ex".to_string(), "http://ex/".to_string())]);
        let rendered = print_triple(&Triple::new(s, p, o), &env, &i);
        assert_eq!(rendered, "ex:a a ex:Thing");
    }

    #[test]
    fn renders_formula_with_rule_arrow() {
        let mut i = Interner::new();
        let body = Term::Formula(std::rc::Rc::new(crate::term::Formula {
            triples: vec![Triple::new(
                Term::variable(&mut i, "x"),
                Term::iri(&mut i, "http://ex/p"),
                Term::variable(&mut i, "y"),
            )],
        }));
        let head = body.clone();
        let env = PrefixEnv::new([]);
        let rendered = print_triple(
            &Triple::new(body, Term::iri(&mut i, LOG_IMPLIES_IRI), head),
            &env,
            &i,
        );
        assert!(rendered.contains("=>"));
    }
}

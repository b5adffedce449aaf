//! Dereference collaborator (SPEC_FULL.md §4.12): resolves `log:content`,
//! `log:semantics`, `log:semanticsOrError`, `log:parsedAsN3` against local
//! files or HTTP(S), with a per-document cache and HTTPS enforcement.

use std::io::Read as _;

use crate::engine::Engine;
use crate::literal;
use crate::subst::Substitution;
use crate::term::Term;
use crate::triple::Triple;

use crate::builtins::bind_or_check;

pub fn log_dereference(engine: &mut Engine, goal: &Triple, local: &str) -> Vec<Substitution> {
    let Term::Iri(k) = &goal.subject else { return Vec::new() };
    let iri = engine.run.interner.resolve(*k).to_string();
    let canonical = strip_fragment(&iri);
    let canonical = if engine.run.config.enforce_https {
        enforce_https(&canonical)
    } else {
        canonical
    };

    match local {
        "content" => {
            let Ok(text) = fetch(engine, &canonical) else { return Vec::new() };
            let value = Term::typed_literal(&mut engine.run.interner, &text, literal::XSD_STRING);
            bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
        }
        "semantics" => {
            let Ok(text) = fetch(engine, &canonical) else { return Vec::new() };
            let Ok(triples) = crate::parser::parse_n3_fragment(&text, &mut engine.run.interner) else {
                return Vec::new();
            };
            let value = Term::Formula(std::rc::Rc::new(crate::term::Formula { triples }));
            bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
        }
        "semanticsOrError" => {
            let value = match fetch(engine, &canonical)
                .map_err(|e| e.to_string())
                .and_then(|text| {
                    crate::parser::parse_n3_fragment(&text, &mut engine.run.interner).map_err(|e| e.to_string())
                }) {
                Ok(triples) => Term::Formula(std::rc::Rc::new(crate::term::Formula { triples })),
                Err(msg) => Term::typed_literal(&mut engine.run.interner, &msg, literal::XSD_STRING),
            };
            bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
        }
        "parsedAsN3" => {
            let ok = fetch(engine, &canonical)
                .ok()
                .map(|text| crate::parser::parse_n3_fragment(&text, &mut engine.run.interner).is_ok())
                .unwrap_or(false);
            let value = Term::typed_literal(&mut engine.run.interner, if ok { "true" } else { "false" }, literal::XSD_BOOLEAN);
            bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
        }
        _ => Vec::new(),
    }
}

fn strip_fragment(iri: &str) -> String {
    match iri.split_once('#') {
        Some((before, _)) => before.to_string(),
        None => iri.to_string(),
    }
}

fn enforce_https(iri: &str) -> String {
    if let Some(rest) = iri.strip_prefix("http://") {
        format!("https://{rest}")
    } else {
        iri.to_string()
    }
}

fn fetch(engine: &mut Engine, canonical: &str) -> Result<String, crate::error::EyelingError> {
    if let Some(cached) = engine.run.deref_cache.get(canonical) {
        return Ok(cached.clone());
    }

    let text = if let Some(path) = canonical.strip_prefix("file://") {
        std::fs::read_to_string(path)?
    } else if canonical.starts_with("http://") || canonical.starts_with("https://") {
        fetch_http(canonical)?
    } else {
        std::fs::read_to_string(canonical)?
    };

    engine.run.deref_cache.insert(canonical.to_string(), text.clone());
    Ok(text)
}

fn fetch_http(url: &str) -> Result<String, crate::error::EyelingError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| crate::error::EyelingError::Dereference { iri: url.to_string(), detail: e.to_string() })?;
    let mut body = String::new();
    response
        .into_reader()
        .read_to_string(&mut body)
        .map_err(|e| crate::error::EyelingError::Dereference { iri: url.to_string(), detail: e.to_string() })?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforce_https_rewrites_scheme() {
        assert_eq!(enforce_https("http://example.org/x"), "https://example.org/x");
        assert_eq!(enforce_https("https://example.org/x"), "https://example.org/x");
    }

    #[test]
    fn strip_fragment_drops_suffix() {
        assert_eq!(strip_fragment("http://example.org/doc#frag"), "http://example.org/doc");
        assert_eq!(strip_fragment("http://example.org/doc"), "http://example.org/doc");
    }
}

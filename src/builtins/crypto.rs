//! `crypto:*` hashing built-ins (spec.md §4.5 Cryptography): hash the
//! subject literal's lexical form, hex-encode, bind into the object.

use hex::encode as hex_encode;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use super::bind_or_check;
use crate::engine::Engine;
use crate::literal;
use crate::subst::Substitution;
use crate::term::Term;
use crate::triple::Triple;

pub const KNOWN: &[&str] = &["md5", "sha", "sha1", "sha256", "sha512"];

pub fn eval(engine: &mut Engine, goal: &Triple, local: &str) -> Vec<Substitution> {
    let Term::Literal(lit) = &goal.subject else { return Vec::new() };
    let lexical = engine.run.interner.resolve(lit.lexical).to_string();
    let digest = match local {
        "md5" => hex_encode(Md5::digest(lexical.as_bytes())),
        "sha" | "sha1" => hex_encode(Sha1::digest(lexical.as_bytes())),
        "sha256" => hex_encode(Sha256::digest(lexical.as_bytes())),
        "sha512" => hex_encode(Sha512::digest(lexical.as_bytes())),
        _ => return Vec::new(),
    };
    let value = Term::typed_literal(&mut engine.run.interner, &digest, literal::XSD_STRING);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReasonerConfig, RunState};

    #[test]
    fn md5_of_empty_string() {
        let mut e = Engine::new(RunState::new(ReasonerConfig::default()));
        let subj = Term::typed_literal(&mut e.run.interner, "", literal::XSD_STRING);
        let out_var = Term::variable(&mut e.run.interner, "h");
        let goal = Triple::new(subj, Term::iri(&mut e.run.interner, "x"), out_var);
        let out = eval(&mut e, &goal, "md5");
        assert_eq!(out.len(), 1);
    }
}

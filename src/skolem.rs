//! Skolem provider (spec.md §4.9).
//!
//! `log:skolem(ground, out)` and head-blank Skolemization both go through
//! here. Ground terms are canonically encoded (a small tagged s-expression,
//! not JSON, but serving the same "structural key" purpose spec.md §4.9
//! describes) and cached per reasoning run. A per-run random salt (hex of 16
//! random bytes, seeded from the OS via a local xorshift rather than pulling
//! in a `rand` dependency the rest of the crate has no other use for) makes
//! default-mode Skolem IRIs differ across runs; deterministic mode uses an
//! empty salt.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::term::{Interner, Term};

pub const SKOLEM_NS: &str = "http://josd.github.io/.well-known/genid/";

pub struct SkolemProvider {
    salt: String,
    cache: HashMap<String, String>,
    /// Per-firing blank-label Skolemization memo: `(rule_firing_id, label)`
    /// -> fresh blank label, so one firing produces the same existential
    /// across all its head triples (spec.md §4.5 "Head Skolemization").
    head_blank_memo: HashMap<(u64, String), String>,
    next_blank: u64,
}

impl SkolemProvider {
    pub fn new(deterministic: bool) -> Self {
        let salt = if deterministic { String::new() } else { random_salt() };
        Self { salt, cache: HashMap::new(), head_blank_memo: HashMap::new(), next_blank: 0 }
    }

    /// `log:skolem(ground, out)`: canonical-encode `ground`, look up or
    /// mint the Skolem IRI string (caller interns it).
    pub fn skolem_iri(&mut self, ground: &Term, interner: &Interner) -> String {
        let key = canonical_encode(ground, interner);
        if let Some(existing) = self.cache.get(&key) {
            return existing.clone();
        }
        let id = stable_hash(&format!("{}{}", self.salt, key));
        let iri = format!("{}{:016x}", SKOLEM_NS, id);
        self.cache.insert(key, iri.clone());
        iri
    }

    /// Fresh blank label for a rule firing's head blank, memoized by
    /// `(firing id, original label)`.
    pub fn fresh_head_blank(&mut self, firing_id: u64, label: &str) -> String {
        let k = (firing_id, label.to_string());
        if let Some(existing) = self.head_blank_memo.get(&k) {
            return existing.clone();
        }
        let id = self.next_blank;
        self.next_blank += 1;
        let fresh = format!("_:sk_{}", id);
        self.head_blank_memo.insert(k, fresh.clone());
        fresh
    }
}

fn random_salt() -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    let pid = std::process::id() as u128;
    let mut x = (nanos ^ (pid << 64) ^ 0x9E3779B97F4A7C15) as u64;
    let mut out = String::with_capacity(32);
    for _ in 0..2 {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        out.push_str(&format!("{:016x}", x));
    }
    out
}

fn stable_hash(s: &str) -> u64 {
    // FNV-1a, deterministic across runs for a given input (the salt is what
    // varies across runs, not the hash function).
    let mut h: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

/// Tagged nested encoding of a ground term (spec.md §4.9): IRIs, literals,
/// blanks, variables, lists, open lists, and formulas each get a distinct
/// tag so that structurally different terms never collide textually.
pub fn canonical_encode(t: &Term, interner: &Interner) -> String {
    match t {
        Term::Iri(k) => format!("I:{}", interner.resolve(*k)),
        Term::Literal(lit) => {
            let lex = interner.resolve(lit.lexical);
            match &lit.suffix {
                crate::term::LiteralSuffix::Plain => format!("L:{}", lex),
                crate::term::LiteralSuffix::Datatype(dt) => {
                    format!("L:{}^^{}", lex, interner.resolve(*dt))
                }
                crate::term::LiteralSuffix::Lang(l) => format!("L:{}@{}", lex, interner.resolve(*l)),
            }
        }
        Term::Blank(k) => format!("B:{}", interner.resolve(*k)),
        Term::Variable(k) => format!("V:{}", interner.resolve(*k)),
        Term::List(items) => {
            let parts: Vec<String> = items.iter().map(|t| canonical_encode(t, interner)).collect();
            format!("[{}]", parts.join(","))
        }
        Term::OpenList(items, tail) => {
            let parts: Vec<String> = items.iter().map(|t| canonical_encode(t, interner)).collect();
            format!("[{}|{}]", parts.join(","), interner.resolve(*tail))
        }
        Term::Formula(f) => {
            let parts: Vec<String> = f
                .triples
                .iter()
                .map(|tr| {
                    format!(
                        "({} {} {})",
                        canonical_encode(&tr.subject, interner),
                        canonical_encode(&tr.predicate, interner),
                        canonical_encode(&tr.object, interner)
                    )
                })
                .collect();
            format!("{{{}}}", parts.join(";"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_mode_is_stable_across_instances() {
        let mut i = Interner::new();
        let ground = Term::iri(&mut i, "http://example/kid");
        let mut p1 = SkolemProvider::new(true);
        let mut p2 = SkolemProvider::new(true);
        assert_eq!(p1.skolem_iri(&ground, &i), p2.skolem_iri(&ground, &i));
    }

    #[test]
    fn same_run_is_stable() {
        let mut i = Interner::new();
        let ground = Term::iri(&mut i, "http://example/kid");
        let mut p = SkolemProvider::new(false);
        let a = p.skolem_iri(&ground, &i);
        let b = p.skolem_iri(&ground, &i);
        assert_eq!(a, b);
    }
}

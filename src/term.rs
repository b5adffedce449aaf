//! Canonical term representation and the interning pools that back it.
//!
//! IRIs and literal lexical forms are interned through `lasso::Rodeo` so that
//! equal strings share identity; every term additionally carries the small
//! integer key the interner handed out, which is what the unifier's fast
//! path and the fact indexes key off of.

use std::fmt;
use std::rc::Rc;

use lasso::{Rodeo, Spur};

use crate::triple::Triple;

/// A single named or blank variable slot. Universally quantified variables
/// (`?x`) and rule-head blank nodes both end up as `Variable`/`Blank` terms;
/// blanks additionally carry document-scoped identity via their label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(Spur),
    Literal(Literal),
    Blank(Spur),
    Variable(Spur),
    List(Rc<Vec<Term>>),
    OpenList(Rc<Vec<Term>>, Spur),
    Formula(Rc<Formula>),
}

/// A literal's canonical lexical form plus its optional datatype/language
/// suffix. Equivalence is *not* derived `PartialEq` — see `literal.rs` for
/// the datatype-aware comparison the unifier actually uses; this `Eq`/`Hash`
/// impl is the strict structural one used for interning/dedup of ground
/// facts (two structurally distinct-but-equivalent literals, e.g. `"1"` and
/// `"1.0"^^xsd:decimal`, are intentionally different keys here).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub lexical: Spur,
    pub suffix: LiteralSuffix,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralSuffix {
    Plain,
    Datatype(Spur),
    Lang(Spur),
}

/// A quoted formula: an ordered-on-disk, unordered-under-equivalence set of
/// triples. Order is retained (it's what you get back out of a round trip
/// through the pretty-printer) but never consulted by unification or
/// equality, which go through `unify::formulas_alpha_equal`.
#[derive(Debug, Clone, Default)]
pub struct Formula {
    pub triples: Vec<Triple>,
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        crate::unify::formulas_structurally_equal(self, other)
    }
}
impl Eq for Formula {}
impl std::hash::Hash for Formula {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Order-independent hash: XOR per-triple hashes. Two alpha-equivalent
        // formulas may still land in different buckets (variable renaming
        // changes the Spur values), which is fine: equality above is the
        // authority, this only needs to be consistent with it for the
        // *structurally* equal case used by interning of ground ground facts.
        let mut acc: u64 = 0;
        for t in &self.triples {
            let mut h = std::collections::hash_map::DefaultHasher::new();
            t.hash(&mut h);
            acc ^= std::hash::Hasher::finish(&h);
        }
        state.write_u64(acc);
    }
}

/// Interns IRI strings and literal lexical forms into stable integer keys.
///
/// One `Interner` is created per reasoning run (see `config::RunState`) and
/// shared by the parser, term constructors, and the Skolem provider.
pub struct Interner {
    pub strings: Rodeo,
}

impl Interner {
    pub fn new() -> Self {
        Self { strings: Rodeo::new() }
    }

    pub fn intern(&mut self, s: &str) -> Spur {
        self.strings.get_or_intern(s)
    }

    pub fn resolve(&self, key: Spur) -> &str {
        self.strings.resolve(&key)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Term {
    pub fn iri(interner: &mut Interner, s: &str) -> Term {
        Term::Iri(interner.intern(s))
    }

    pub fn variable(interner: &mut Interner, name: &str) -> Term {
        Term::Variable(interner.intern(name))
    }

    pub fn blank(interner: &mut Interner, label: &str) -> Term {
        Term::Blank(interner.intern(label))
    }

    pub fn plain_literal(interner: &mut Interner, lexical: &str) -> Term {
        Term::Literal(Literal { lexical: interner.intern(lexical), suffix: LiteralSuffix::Plain })
    }

    pub fn typed_literal(interner: &mut Interner, lexical: &str, datatype_iri: &str) -> Term {
        let lex = interner.intern(lexical);
        let dt = interner.intern(datatype_iri);
        Term::Literal(Literal { lexical: lex, suffix: LiteralSuffix::Datatype(dt) })
    }

    pub fn lang_literal(interner: &mut Interner, lexical: &str, lang: &str) -> Term {
        let lex = interner.intern(lexical);
        let l = interner.intern(lang);
        Term::Literal(Literal { lexical: lex, suffix: LiteralSuffix::Lang(l) })
    }

    /// `rdf:nil` and `List([])` are interchangeable for unification (spec.md
    /// §3). This only tests for the empty-list shape; callers that need to
    /// recognize the *IRI* `rdf:nil` compare interned strings directly.
    pub fn is_empty_list(&self) -> bool {
        matches!(self, Term::List(items) if items.is_empty())
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_ground(&self) -> bool {
        match self {
            Term::Variable(_) => false,
            Term::OpenList(_, _) => false,
            Term::Iri(_) | Term::Literal(_) | Term::Blank(_) => true,
            Term::List(items) => items.iter().all(Term::is_ground),
            Term::Formula(f) => f.triples.iter().all(|t| {
                t.subject.is_ground() && t.predicate.is_ground() && t.object.is_ground()
            }),
        }
    }

    /// Every variable name occurring anywhere in the term, including inside
    /// nested formulas and list elements. Used by rule standardization and
    /// by the substitution engine's GC pass.
    pub fn collect_variables(&self, out: &mut Vec<Spur>) {
        match self {
            Term::Variable(v) => out.push(*v),
            Term::OpenList(items, tail) => {
                for i in items.iter() {
                    i.collect_variables(out);
                }
                out.push(*tail);
            }
            Term::List(items) => {
                for i in items.iter() {
                    i.collect_variables(out);
                }
            }
            Term::Formula(f) => {
                for t in &f.triples {
                    t.subject.collect_variables(out);
                    t.predicate.collect_variables(out);
                    t.object.collect_variables(out);
                }
            }
            Term::Iri(_) | Term::Literal(_) | Term::Blank(_) => {}
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug-only rendering (key ids, not resolved strings); real N3
        // rendering goes through `printer::print_term` which has access to
        // an `Interner` and a prefix environment.
        match self {
            Term::Iri(k) => write!(f, "<iri:{:?}>", k),
            Term::Literal(lit) => write!(f, "<lit:{:?}>", lit.lexical),
            Term::Blank(k) => write!(f, "_:b{:?}", k),
            Term::Variable(k) => write!(f, "?v{:?}", k),
            Term::List(items) => write!(f, "({} items)", items.len()),
            Term::OpenList(items, _) => write!(f, "({} items | tail)", items.len()),
            Term::Formula(fo) => write!(f, "{{{} triples}}", fo.triples.len()),
        }
    }
}

//! Triples, rules, and derivation records.

use std::rc::Rc;

use lasso::Spur;

use crate::subst::Substitution;
use crate::term::Term;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self { subject, predicate, object }
    }

    pub fn is_ground(&self) -> bool {
        self.subject.is_ground() && self.predicate.is_ground() && self.object.is_ground()
    }

    pub fn collect_variables(&self, out: &mut Vec<Spur>) {
        self.subject.collect_variables(out);
        self.predicate.collect_variables(out);
        self.object.collect_variables(out);
    }
}

/// A rule is data, never a host-language closure (spec.md §9 "Dynamic
/// predicates as data"). Forward rules drive the forward chainer; backward
/// rules are consulted only by the prover when expanding a goal.
#[derive(Debug, Clone)]
pub struct Rule {
    pub premises: Vec<Triple>,
    pub conclusions: Vec<Triple>,
    pub direction: RuleDirection,
    /// `{ body } => false` — firing signals contradiction (spec.md §4.6, §7).
    pub is_fuse: bool,
    /// Blank-node labels occurring in the conclusion; Skolemized fresh on
    /// every firing (spec.md §4.5 "Head Skolemization").
    pub head_blanks: Vec<Spur>,
    /// Monotonically increasing id, used for standardize-apart suffixes and
    /// as half of the rule-promotion dedup key.
    pub id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleDirection {
    Forward,
    Backward,
}

impl Rule {
    /// Structural key for deduplicating promoted rules (spec.md §4.6,
    /// §9): two rules with the same premises/conclusions/direction up to
    /// the exact interned term keys (i.e. already standardized to the same
    /// variable names, which rule promotion guarantees by construction)
    /// collapse to one.
    pub fn canonical_key(&self) -> RuleKey {
        RuleKey {
            premises: self.premises.clone(),
            conclusions: self.conclusions.clone(),
            direction: self.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleKey {
    premises: Vec<Triple>,
    conclusions: Vec<Triple>,
    direction: RuleDirection,
}

/// One fired-rule record: what was concluded, from which rule, against
/// which ground premise instance, under which substitution. Append-only
/// (spec.md §3 "Lifecycle").
#[derive(Debug, Clone)]
pub struct DerivedFact {
    pub conclusion: Triple,
    pub rule_id: u64,
    pub premise_instance: Rc<Vec<Triple>>,
    pub substitution: Substitution,
}

//! The shared reasoning context threaded through the prover, built-in
//! evaluator, and forward chainer (spec.md §4.13, §5).
//!
//! This is the "explicit reasoning context" spec.md §9 asks for in place of
//! ambient globals: one `Engine` per outermost `reason()` call, its `run`
//! field (interner, Skolem cache, config) surviving into any nested
//! `log:conclusion` sub-reasoning, everything else scoped to that one call.

use crate::config::RunState;
use crate::index::{FactIndex, RuleIndex};
use crate::term::Term;
use crate::triple::{DerivedFact, Rule};

/// A frozen view of the fact set at a given closure level, used to answer
/// scoped builtins in forward-chainer Phase B (spec.md §4.6, §4.7).
pub struct Snapshot {
    pub facts: FactIndex,
    pub level: u32,
}

pub struct Engine {
    pub facts: FactIndex,
    pub backward_rules: RuleIndex,
    pub forward_rules: Vec<Rule>,
    pub run: RunState,
    pub snapshot: Option<Snapshot>,
    pub derivations: Vec<DerivedFact>,
    pub fuse_triggered: bool,
    /// `(subject, text)` pairs recorded by `log:outputString`, in firing
    /// order; the `--strings` CLI mode re-sorts these by subject key
    /// (spec.md §6 "Ordering of log:outputString output").
    pub output_strings: Vec<(Term, String)>,
}

impl Engine {
    pub fn new(run: RunState) -> Self {
        Self {
            facts: FactIndex::new(),
            backward_rules: RuleIndex::new(),
            forward_rules: Vec::new(),
            run,
            snapshot: None,
            derivations: Vec::new(),
            fuse_triggered: false,
            output_strings: Vec::new(),
        }
    }

    /// Rebuild the backward-rule index's wildcard/by-predicate buckets after
    /// a rule promotion adds a new rule (spec.md §4.6).
    pub fn add_backward_rule(&mut self, rule: Rule) {
        self.backward_rules.push(rule);
    }

    pub fn record(&mut self, fact: DerivedFact) {
        self.derivations.push(fact);
    }
}

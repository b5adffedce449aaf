//! Reasoning context (spec.md §4.13, §5 "Global state").
//!
//! Tunables and shared caches are threaded explicitly as a `RunState` rather
//! than held in statics, matching the teacher's pattern of passing an
//! explicit context object (`SemanticCompiler::new(schema)`) instead of
//! reaching for `OnceLock`/globals the way its `reasoning` sub-crate does
//! around its `egglog::EGraph`.

use std::collections::HashMap;

use crate::skolem::SkolemProvider;
use crate::term::Interner;

/// Flags read once at the start of a run and restored on exit (spec.md §5).
#[derive(Debug, Clone, Copy)]
pub struct ReasonerConfig {
    pub enforce_https: bool,
    pub proof_comments: bool,
    pub super_restricted: bool,
    pub deterministic_skolem: bool,
    pub max_results: Option<usize>,
    pub include_input_facts_in_closure: bool,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            enforce_https: false,
            proof_comments: false,
            super_restricted: false,
            deterministic_skolem: false,
            max_results: None,
            include_input_facts_in_closure: true,
        }
    }
}

/// Per-run shared state: interners, Skolem cache, dereference cache. Cleared
/// on entering the outermost run, preserved across nested calls such as an
/// inner `log:conclusion` evaluation (spec.md §5, §9).
pub struct RunState {
    pub interner: Interner,
    pub skolem: SkolemProvider,
    pub deref_cache: HashMap<String, String>,
    pub config: ReasonerConfig,
    next_rule_id: u64,
}

impl RunState {
    pub fn new(config: ReasonerConfig) -> Self {
        Self {
            interner: Interner::new(),
            skolem: SkolemProvider::new(config.deterministic_skolem),
            deref_cache: HashMap::new(),
            config,
            next_rule_id: 0,
        }
    }

    pub fn fresh_rule_id(&mut self) -> u64 {
        let id = self.next_rule_id;
        self.next_rule_id += 1;
        id
    }
}

//! End-to-end scenarios run through the top-level `reason()` entry point.

use eyeling::error::ReasonStatus;
use eyeling::reason::{reason, ReasonOptions};
use eyeling::term::Term;
use eyeling::triple::Triple;

fn run(src: &str) -> eyeling::reason::ReasonOutput {
    reason(src, ReasonOptions::default()).expect("reasoning should succeed")
}

fn has_triple(facts: &[Triple], s: &str, p: &str, o: &str, out: &eyeling::reason::ReasonOutput) -> bool {
    facts.iter().any(|t| render(&t.subject, out) == s && render(&t.predicate, out) == p && render(&t.object, out) == o)
}

fn render(t: &Term, out: &eyeling::reason::ReasonOutput) -> String {
    let env = eyeling::printer::PrefixEnv::new(out.prefixes.clone());
    eyeling::printer::print_term(t, &env, &out.engine.run.interner)
}

#[test]
fn transitive_closure_over_a_chain() {
    let out = run(
        "@prefix : <http://ex/> .\n\
         :a :r :b . :b :r :c . :c :r :d .\n\
         { ?x :r ?y . ?y :r ?z } => { ?x :r ?z } .",
    );
    assert!(matches!(out.status, ReasonStatus::Ok));
    assert!(has_triple(&out.facts, ":a", ":r", ":c", &out));
    assert!(has_triple(&out.facts, ":b", ":r", ":d", &out));
    assert!(has_triple(&out.facts, ":a", ":r", ":d", &out));
}

#[test]
fn list_sum_derives_total() {
    let out = run(
        "@prefix : <http://ex/> .\n\
         @prefix math: <http://www.w3.org/2000/10/swap/math#> .\n\
         { ( 1 2 3 ) math:sum ?s } => { :t :v ?s } .",
    );
    assert!(matches!(out.status, ReasonStatus::Ok));
    assert!(out.facts.iter().any(|t| {
        render(&t.subject, &out) == ":t"
            && render(&t.predicate, &out) == ":v"
            && matches!(&t.object, Term::Literal(lit) if out.engine.run.interner.resolve(lit.lexical) == "6")
    }));
}

#[test]
fn rdf_list_traversal_counts_elements() {
    let out = run(
        "@prefix : <http://ex/> .\n\
         @prefix list: <http://www.w3.org/2000/10/swap/list#> .\n\
         :x :has ( \"a\" \"b\" \"c\" ) .\n\
         { :x :has ?l . ?l list:length ?n } => { :x :count ?n } .",
    );
    assert!(matches!(out.status, ReasonStatus::Ok));
    assert!(out.facts.iter().any(|t| {
        matches!(&t.object, Term::Literal(lit) if out.engine.run.interner.resolve(lit.lexical) == "3")
            && render(&t.predicate, &out) == ":count"
    }));
}

#[test]
fn negation_via_scoped_closure_finds_unique_subject() {
    let out = run(
        "@prefix : <http://ex/> .\n\
         @prefix list: <http://www.w3.org/2000/10/swap/list#> .\n\
         @prefix log: <http://www.w3.org/2000/10/swap/log#> .\n\
         :a :p 1 .\n\
         { ?x :p ?v . (1 { ?y :p ?v . ?y log:notEqualTo ?x } ()) log:collectAllIn ?others . \
           ?others list:length 0 } => { ?x :unique true } .",
    );
    assert!(matches!(out.status, ReasonStatus::Ok));
    assert!(out.facts.iter().any(|t| render(&t.subject, &out) == ":a" && render(&t.predicate, &out) == ":unique"));
}

#[test]
fn fuse_rule_exits_with_contradiction_status() {
    let out = run(
        "@prefix : <http://ex/> .\n\
         @prefix math: <http://www.w3.org/2000/10/swap/math#> .\n\
         :a :age 200 .\n\
         { ?x :age ?v . ?v math:greaterThan 150 } => false .",
    );
    assert!(matches!(out.status, ReasonStatus::Fuse));
    assert_eq!(out.status.exit_code(), 2);
}

#[test]
fn skolemized_head_blank_is_shared_across_the_firing() {
    let out = run(
        "@prefix : <http://ex/> .\n\
         :kid :parent :pat .\n\
         { ?x :parent ?p } => { ?p :hasChild [ :of ?x ] } .",
    );
    assert!(matches!(out.status, ReasonStatus::Ok));
    let child_edge = out.facts.iter().find(|t| render(&t.predicate, &out) == ":hasChild");
    let of_edge = out.facts.iter().find(|t| render(&t.predicate, &out) == ":of");
    let (child_edge, of_edge) = (child_edge.expect("hasChild edge"), of_edge.expect("of edge"));
    assert_eq!(child_edge.object, of_edge.subject);
    assert_eq!(render(&of_edge.object, &out), ":kid");
}

#[test]
fn two_runs_assign_different_skolem_iris_in_default_mode() {
    let src = "@prefix : <http://ex/> .\n\
               :kid :parent :pat .\n\
               { ?x :parent ?p } => { ?p :hasChild [ :of ?x ] } .";
    let a = run(src);
    let b = run(src);
    let edge_a = a.facts.iter().find(|t| render(&t.predicate, &a) == ":hasChild").unwrap();
    let edge_b = b.facts.iter().find(|t| render(&t.predicate, &b) == ":hasChild").unwrap();
    assert_ne!(render(&edge_a.object, &a), render(&edge_b.object, &b));
}

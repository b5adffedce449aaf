//! Recursive-descent N3 parser (SPEC_FULL.md §4.10).
//!
//! Produces a flat triple list from a fragment (used by `log:semantics`),
//! or a full document split into facts/forward rules/backward rules (used
//! by the top-level `reason()` entry point). Rule lifting — recognizing a
//! top-level `{body} => {head}` or `{head} <= {body}` triple and turning it
//! into a live `Rule` — only happens at the document level; the same shape
//! occurring inside a quoted formula stays a plain triple.

use std::collections::HashMap;
use std::rc::Rc;

use crate::builtins::is_constraint_predicate;
use crate::config::RunState;
use crate::error::EyelingError;
use crate::literal;
use crate::term::{Formula, Interner, Term};
use crate::triple::{Rule, RuleDirection, Triple};

use super::lexer::{Lexer, Token, TokenKind};

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const OWL_SAME_AS: &str = "http://www.w3.org/2002/07/owl#sameAs";
pub const LOG_IMPLIES: &str = "http://www.w3.org/2000/10/swap/log#implies";
pub const LOG_IMPLIED_BY: &str = "http://www.w3.org/2000/10/swap/log#impliedBy";

pub struct ParsedDocument {
    pub prefixes: HashMap<String, String>,
    pub facts: Vec<Triple>,
    pub forward_rules: Vec<Rule>,
    pub backward_rules: Vec<Rule>,
}

/// Parses a standalone fragment (no rule lifting, no directives beyond
/// `@prefix`/`@base`) into a flat triple list, for `log:semantics` et al.
pub fn parse_n3_fragment(text: &str, interner: &mut Interner) -> Result<Vec<Triple>, EyelingError> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut p = Parser { tokens, pos: 0, prefixes: HashMap::new() };
    p.parse_top_level(interner)
}

/// Parses a full document and lifts top-level rule-shaped triples into live
/// `Rule` records (spec.md §4.10, §4.6).
pub fn parse_document(text: &str, run: &mut RunState) -> Result<ParsedDocument, EyelingError> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut p = Parser { tokens, pos: 0, prefixes: HashMap::new() };
    let triples = p.parse_top_level(&mut run.interner)?;
    let (facts, forward_rules, backward_rules) = lift_rules(triples, run);
    Ok(ParsedDocument { prefixes: p.prefixes, facts, forward_rules, backward_rules })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    prefixes: HashMap<String, String>,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn here(&self) -> (usize, usize) {
        (self.tokens[self.pos].line, self.tokens[self.pos].column)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.tokens[self.pos].kind.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn err(&self, message: impl Into<String>) -> EyelingError {
        let (line, column) = self.here();
        EyelingError::Syntax { message: message.into(), line, column }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), EyelingError> {
        if *self.peek() == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {kind:?}, found {:?}", self.peek())))
        }
    }

    fn parse_top_level(&mut self, interner: &mut Interner) -> Result<Vec<Triple>, EyelingError> {
        let mut out = Vec::new();
        loop {
            match self.peek().clone() {
                TokenKind::Eof => break,
                TokenKind::Bare(w) if w == "prefix" => {
                    self.advance();
                    self.parse_prefix_directive()?;
                }
                TokenKind::Bare(w) if w == "base" => {
                    self.advance();
                    self.parse_base_directive()?;
                }
                _ => self.parse_statement(interner, &mut out)?,
            }
        }
        Ok(out)
    }

    fn parse_prefix_directive(&mut self) -> Result<(), EyelingError> {
        let prefix = match self.advance() {
            TokenKind::PrefixedName(p, l) if l.is_empty() => p,
            other => return Err(self.err(format!("expected prefix label, found {other:?}"))),
        };
        let iri = match self.advance() {
            TokenKind::Iri(s) => s,
            other => return Err(self.err(format!("expected IRI, found {other:?}"))),
        };
        self.expect(TokenKind::Dot)?;
        self.prefixes.insert(prefix, iri);
        Ok(())
    }

    fn parse_base_directive(&mut self) -> Result<(), EyelingError> {
        match self.advance() {
            TokenKind::Iri(_) => {}
            other => return Err(self.err(format!("expected IRI, found {other:?}"))),
        };
        self.expect(TokenKind::Dot)
    }

    fn parse_statement(&mut self, interner: &mut Interner, out: &mut Vec<Triple>) -> Result<(), EyelingError> {
        let subject = self.parse_term(interner, out)?;
        self.parse_predicate_object_list(&subject, interner, out)?;
        self.expect(TokenKind::Dot)
    }

    fn parse_predicate_object_list(
        &mut self,
        subject: &Term,
        interner: &mut Interner,
        out: &mut Vec<Triple>,
    ) -> Result<(), EyelingError> {
        loop {
            let predicate = self.parse_predicate(interner)?;
            self.parse_object_list(subject, &predicate, interner, out)?;
            if *self.peek() == TokenKind::Semicolon {
                self.advance();
                if matches!(self.peek(), TokenKind::Dot | TokenKind::RBrace | TokenKind::Eof) {
                    break;
                }
                continue;
            }
            break;
        }
        Ok(())
    }

    fn parse_object_list(
        &mut self,
        subject: &Term,
        predicate: &Term,
        interner: &mut Interner,
        out: &mut Vec<Triple>,
    ) -> Result<(), EyelingError> {
        loop {
            let object = self.parse_term(interner, out)?;
            out.push(Triple::new(subject.clone(), predicate.clone(), object));
            if *self.peek() == TokenKind::Comma {
                self.advance();
                continue;
            }
            break;
        }
        Ok(())
    }

    fn parse_predicate(&mut self, interner: &mut Interner) -> Result<Term, EyelingError> {
        match self.advance() {
            TokenKind::Bare(w) if w == "a" => Ok(Term::iri(interner, RDF_TYPE)),
            TokenKind::Eq => Ok(Term::iri(interner, OWL_SAME_AS)),
            TokenKind::Implies => Ok(Term::iri(interner, LOG_IMPLIES)),
            TokenKind::ImpliedBy => Ok(Term::iri(interner, LOG_IMPLIED_BY)),
            TokenKind::Iri(s) => Ok(Term::iri(interner, &s)),
            TokenKind::PrefixedName(p, l) => self.resolve_prefixed(&p, &l, interner),
            other => Err(self.err(format!("unexpected token in predicate position: {other:?}"))),
        }
    }

    fn resolve_prefixed(&self, prefix: &str, local: &str, interner: &mut Interner) -> Result<Term, EyelingError> {
        let base = self
            .prefixes
            .get(prefix)
            .ok_or_else(|| self.err(format!("undefined prefix '{prefix}:'")))?;
        Ok(Term::iri(interner, &format!("{base}{local}")))
    }

    fn parse_term(&mut self, interner: &mut Interner, out: &mut Vec<Triple>) -> Result<Term, EyelingError> {
        match self.advance() {
            TokenKind::Iri(s) => Ok(Term::iri(interner, &s)),
            TokenKind::PrefixedName(p, l) => self.resolve_prefixed(&p, &l, interner),
            TokenKind::Variable(n) => Ok(Term::variable(interner, &n)),
            TokenKind::BlankLabel(n) => Ok(Term::blank(interner, &n)),
            TokenKind::Number(lex) => Ok(numeric_term(&lex, interner)),
            TokenKind::Str(lex) => self.parse_literal_suffix(lex, interner),
            TokenKind::Bare(w) if w == "true" || w == "false" => {
                Ok(Term::typed_literal(interner, &w, literal::XSD_BOOLEAN))
            }
            TokenKind::LBrace => self.parse_formula(interner),
            TokenKind::LParen => self.parse_list(interner, out),
            TokenKind::LBracket => self.parse_blank_property_list(interner, out),
            other => Err(self.err(format!("unexpected token in term position: {other:?}"))),
        }
    }

    fn parse_literal_suffix(&mut self, lex: String, interner: &mut Interner) -> Result<Term, EyelingError> {
        match self.peek().clone() {
            TokenKind::DoubleCaret => {
                self.advance();
                let dt = match self.advance() {
                    TokenKind::Iri(s) => s,
                    TokenKind::PrefixedName(p, l) => {
                        let base = self
                            .prefixes
                            .get(&p)
                            .ok_or_else(|| self.err(format!("undefined prefix '{p}:'")))?;
                        format!("{base}{l}")
                    }
                    other => return Err(self.err(format!("expected datatype IRI, found {other:?}"))),
                };
                Ok(Term::typed_literal(interner, &lex, &dt))
            }
            TokenKind::LangTag(tag) => {
                self.advance();
                Ok(Term::lang_literal(interner, &lex, &tag))
            }
            _ => Ok(Term::plain_literal(interner, &lex)),
        }
    }

    fn parse_formula(&mut self, interner: &mut Interner) -> Result<Term, EyelingError> {
        let mut triples = Vec::new();
        while *self.peek() != TokenKind::RBrace {
            self.parse_statement(interner, &mut triples)?;
        }
        self.advance();
        Ok(Term::Formula(Rc::new(Formula { triples })))
    }

    fn parse_list(&mut self, interner: &mut Interner, out: &mut Vec<Triple>) -> Result<Term, EyelingError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                TokenKind::RParen => {
                    self.advance();
                    return Ok(Term::List(Rc::new(items)));
                }
                TokenKind::Pipe => {
                    self.advance();
                    let tail = match self.advance() {
                        TokenKind::Variable(n) => interner.intern(&n),
                        other => return Err(self.err(format!("expected tail variable, found {other:?}"))),
                    };
                    self.expect(TokenKind::RParen)?;
                    return Ok(Term::OpenList(Rc::new(items), tail));
                }
                _ => items.push(self.parse_term(interner, out)?),
            }
        }
    }

    /// `[ p1 o1 ; p2 o2 ]`: a fresh blank node with an inline property list,
    /// whose generated triples are pushed into the surrounding statement's
    /// output rather than returned.
    fn parse_blank_property_list(
        &mut self,
        interner: &mut Interner,
        out: &mut Vec<Triple>,
    ) -> Result<Term, EyelingError> {
        let label = format!("_anon_{}_{}", self.tokens[self.pos].line, self.tokens[self.pos].column);
        let blank = Term::blank(interner, &label);
        if *self.peek() != TokenKind::RBracket {
            self.parse_predicate_object_list(&blank, interner, out)?;
        }
        self.expect(TokenKind::RBracket)?;
        Ok(blank)
    }
}

fn numeric_term(lex: &str, interner: &mut Interner) -> Term {
    let datatype = if lex.contains('e') || lex.contains('E') {
        literal::XSD_DOUBLE
    } else if lex.contains('.') {
        literal::XSD_DECIMAL
    } else {
        literal::XSD_INTEGER
    };
    Term::typed_literal(interner, lex, datatype)
}

/// Recognizes top-level `{body} => {head}`, `{head} <= {body}`, and
/// `{body} => false` triples and converts them into live rules, reordering
/// forward-rule premises so constraint builtins trail binding goals (spec.md
/// §4.6 "Ordering inside rules", GLOSSARY "Premise reordering").
fn lift_rules(triples: Vec<Triple>, run: &mut RunState) -> (Vec<Triple>, Vec<Rule>, Vec<Rule>) {
    let implies_k = run.interner.intern(LOG_IMPLIES);
    let implied_by_k = run.interner.intern(LOG_IMPLIED_BY);

    let mut facts = Vec::new();
    let mut forward = Vec::new();
    let mut backward = Vec::new();

    for t in triples {
        let is_implies = matches!(&t.predicate, Term::Iri(k) if *k == implies_k);
        let is_implied_by = matches!(&t.predicate, Term::Iri(k) if *k == implied_by_k);

        if is_implies {
            if let Term::Formula(body) = &t.subject {
                if is_literal_false(&t.object, &run.interner) {
                    forward.push(build_rule(body.triples.clone(), Vec::new(), RuleDirection::Forward, true, run));
                    continue;
                }
                if let Term::Formula(head) = &t.object {
                    forward.push(build_rule(
                        body.triples.clone(),
                        head.triples.clone(),
                        RuleDirection::Forward,
                        false,
                        run,
                    ));
                    continue;
                }
            }
        } else if is_implied_by {
            if let (Term::Formula(head), Term::Formula(body)) = (&t.subject, &t.object) {
                backward.push(build_rule(body.triples.clone(), head.triples.clone(), RuleDirection::Backward, false, run));
                continue;
            }
        }
        facts.push(t);
    }

    (facts, forward, backward)
}

fn is_literal_false(t: &Term, interner: &Interner) -> bool {
    match t {
        Term::Literal(lit) => interner.resolve(lit.lexical) == "false",
        _ => false,
    }
}

fn build_rule(
    mut premises: Vec<Triple>,
    conclusions: Vec<Triple>,
    direction: RuleDirection,
    is_fuse: bool,
    run: &mut RunState,
) -> Rule {
    if direction == RuleDirection::Forward {
        reorder_constraints_last(&mut premises, &run.interner);
    }
    let mut head_blanks = Vec::new();
    for c in &conclusions {
        crate::forward::collect_blanks(&c.subject, &mut head_blanks);
        crate::forward::collect_blanks(&c.predicate, &mut head_blanks);
        crate::forward::collect_blanks(&c.object, &mut head_blanks);
    }
    Rule { premises, conclusions, direction, is_fuse, head_blanks, id: run.fresh_rule_id() }
}

fn reorder_constraints_last(premises: &mut [Triple], interner: &Interner) {
    premises.sort_by_key(|t| match &t.predicate {
        Term::Iri(k) if is_constraint_predicate(interner.resolve(*k)) => 1u8,
        _ => 0u8,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReasonerConfig;

    #[test]
    fn parses_simple_triple() {
        let mut run = RunState::new(ReasonerConfig::default());
        let doc = parse_document(
            "@prefix : <http://ex/> .\n:a :p :b .",
            &mut run,
        )
        .unwrap();
        assert_eq!(doc.facts.len(), 1);
    }

    #[test]
    fn lifts_forward_rule() {
        let mut run = RunState::new(ReasonerConfig::default());
        let doc = parse_document(
            "@prefix : <http://ex/> .\n{ ?x :p ?y } => { ?y :q ?x } .",
            &mut run,
        )
        .unwrap();
        assert!(doc.facts.is_empty());
        assert_eq!(doc.forward_rules.len(), 1);
    }

    #[test]
    fn parses_fuse_rule() {
        let mut run = RunState::new(ReasonerConfig::default());
        let doc = parse_document(
            "@prefix : <http://ex/> .\n{ ?x :p ?y } => false .",
            &mut run,
        )
        .unwrap();
        assert_eq!(doc.forward_rules.len(), 1);
        assert!(doc.forward_rules[0].is_fuse);
    }

    #[test]
    fn parses_list_and_a_sugar() {
        let mut run = RunState::new(ReasonerConfig::default());
        let doc = parse_document(
            "@prefix : <http://ex/> .\n:a a :Thing .\n:a :items ( 1 2 3 ) .",
            &mut run,
        )
        .unwrap();
        assert_eq!(doc.facts.len(), 2);
    }
}

//! N3 tokenizer and recursive-descent parser (SPEC_FULL.md §4.10).

mod grammar;
mod lexer;

pub use grammar::{
    parse_document, parse_n3_fragment, ParsedDocument, LOG_IMPLIED_BY as LOG_IMPLIED_BY_IRI,
    LOG_IMPLIES as LOG_IMPLIES_IRI, OWL_SAME_AS as OWL_SAME_AS_IRI, RDF_TYPE as RDF_TYPE_IRI,
};

//! Tokenizer tests over the public path API.

use std::sync::Arc;

use trellis::foundation::{ErrorClass, ErrorKind};
use trellis::path::{EntityPath, Token};

fn key(text: &str) -> Token {
    Token::Key(Arc::from(text))
}

#[test]
fn tokenizes_mixed_segments() {
    let tokens = EntityPath::tokenize("prop1[0][100]._prop2").unwrap();
    assert_eq!(
        tokens,
        vec![key("prop1"), Token::Index(0), Token::Index(100), key("_prop2")],
    );
}

#[test]
fn tokenizes_leading_operator() {
    let tokens = EntityPath::tokenize("^^.first[3].second").unwrap();
    assert_eq!(
        tokens,
        vec![Token::Parents(2), key("first"), Token::Index(3), key("second")],
    );
}

#[test]
fn dollar_and_underscore_identifiers() {
    let tokens = EntityPath::tokenize("$a._b.c$d_0").unwrap();
    assert_eq!(tokens, vec![key("$a"), key("_b"), key("c$d_0")]);
}

#[test]
fn rejects_malformed_paths() {
    for source in [
        "abc.",      // trailing dot
        "abc..def",  // dot not followed by identifier
        "abc[0]def", // bracket not followed by dot or end
        "abc[",      // unterminated bracket
        "abc[]",     // empty index
        "abc[1.5]",  // non-digit index
        "abc[-1]",   // negative index
        "a b",       // stray character
        "a.^^",      // operator past the front
        "^^^abc",    // identifier directly after operator
        "9abc",      // identifier cannot start with a digit
    ] {
        let err = EntityPath::parse(source).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Syntax, "accepted {source:?}");
    }
}

#[test]
fn syntax_errors_carry_positions() {
    let err = EntityPath::parse("abc[0]def").unwrap_err();
    let ErrorKind::Syntax { position, .. } = err.kind else {
        panic!("expected a syntax error");
    };
    assert_eq!(position, 6);
}

#[test]
fn operator_only_paths() {
    assert_eq!(EntityPath::tokenize("^").unwrap(), vec![Token::Parents(1)]);
    assert_eq!(EntityPath::tokenize("^^^").unwrap(), vec![Token::Parents(3)]);
    assert_eq!(
        EntityPath::tokenize("^^^[0]").unwrap(),
        vec![Token::Parents(3), Token::Index(0)],
    );
}

#[test]
fn empty_path_parses_to_no_tokens() {
    assert!(EntityPath::tokenize("").unwrap().is_empty());
    assert!(EntityPath::parse("").unwrap().is_empty());
}

//! Path construction, joining, and rendering.

use std::sync::Arc;

use trellis::foundation::ErrorClass;
use trellis::path::{EntityPath, PathPart, Token};

fn key(text: &str) -> Token {
    Token::Key(Arc::from(text))
}

#[test]
fn join_concatenates_mixed_parts() {
    let joined = EntityPath::join([PathPart::from("a.b[0]"), PathPart::from("c")]).unwrap();
    assert_eq!(
        joined.tokens(),
        &[key("a"), key("b"), Token::Index(0), key("c")],
    );
    assert_eq!(joined.to_string(), "a.b[0].c");
}

#[test]
fn join_accepts_bare_indices_and_token_vecs() {
    let joined = EntityPath::join([
        PathPart::from("top"),
        PathPart::from(4usize),
        PathPart::from(vec![key("leaf")]),
    ])
    .unwrap();
    assert_eq!(joined.to_string(), "top[4].leaf");
}

#[test]
fn display_round_trips_through_parse() {
    for source in [
        "",
        "a",
        "[0]",
        "^^._abc[0].foo[1][2][3].bar.baz",
        "^",
        "$x._y[10]",
    ] {
        let path = EntityPath::parse(source).unwrap();
        let reparsed = EntityPath::parse(&path.to_string()).unwrap();
        assert_eq!(path, reparsed, "round trip failed for {source:?}");
    }
}

#[test]
fn normalize_unifies_input_forms() {
    let canonical = EntityPath::parse("a.b[2]").unwrap();
    assert_eq!(EntityPath::normalize("a.b[2]").unwrap(), canonical);
    assert_eq!(
        EntityPath::normalize(vec![key("a"), key("b"), Token::Index(2)]).unwrap(),
        canonical,
    );
    assert_eq!(EntityPath::normalize(&canonical).unwrap(), canonical);
}

#[test]
fn token_sequences_reject_misplaced_operator() {
    let err = EntityPath::from_tokens(vec![key("a"), Token::Parents(1)]).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    let err = EntityPath::join([PathPart::from("a.b"), PathPart::from("^")]).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);
}

#[test]
fn token_key_constructor_classifies_text() {
    assert_eq!(Token::key("abc").unwrap(), key("abc"));
    assert_eq!(Token::key("^^").unwrap(), Token::Parents(2));
    assert!(Token::key("not valid").is_err());
    assert!(Token::key("").is_err());
    assert!(Token::key("^a").is_err());
}

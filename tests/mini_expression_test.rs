mod common;

use jamon::chars;
use jamon::matcher::{
    assert_matches, attachment, find_first_bf, for_parent, node, NodeMatcher, Path,
};
use jamon::parser::prelude::*;
use jamon::parser::{parse, Parser, Reference, Rule};
use jamon::{rules, Attachment, ParseError};

fn word_boundary(token: &str) -> Parser {
    lsequence(rules![
        exact(token),
        peek(alternative(rules![
            matches1(chars::not(chars::identifier_part())),
            end_of_input()
        ]))
    ])
}

fn literal() -> Parser {
    lalternative(rules![
        word_boundary("null").attach("null"),
        word_boundary("true").attach("true"),
        word_boundary("false").attach("false"),
        integer(),
        string(),
    ])
}

fn identifier() -> Parser {
    join(sequence([
        matches(1, Some(1), chars::identifier_start()),
        matches(0, None, chars::identifier_part()),
    ]))
}

fn integer() -> Parser {
    matches1(chars::digit()).attach("long")
}

fn string() -> Parser {
    let quoted = |quote: char| {
        let delimiter = quote.to_string();
        let escaped = format!("\\{}", quote);
        between(
            &delimiter,
            repeat0(alternative(rules![
                exact(&escaped),
                matches1(chars::none_of(&[quote]))
            ])),
            &delimiter,
        )
    };
    join(alternative([quoted('"'), quoted('\'')])).attach("string")
}

fn field_ref(expr: &Reference, identifier: &Parser) -> Parser {
    let index = between("[", expr, "]").attach("index");
    delimited_by(
        1,
        lsequence(rules![identifier.attach("field"), lrepeat0(&index)]),
        ".",
    )
    .attach("reference")
}

fn sskip(token: &str) -> Parser {
    strip(skip_token(token))
}

fn oper(term: impl Into<Rule>, op: &Parser) -> Parser {
    let term = term.into();
    lalternative(rules![delimited_sequence(2, &term, op).attach("oper"), term])
}

fn operator(tokens: &[&'static str]) -> Parser {
    strip(lalternative(tokens.iter().map(|token| exact(token).attach(*token))))
}

fn expression() -> Parser {
    let identifier = identifier();
    let mul_op = operator(&["*", "/"]);
    let add_op = operator(&["+", "-"]);
    // longest operators first
    let rel_op = operator(&["==", "!=", "<=", "<", ">=", ">"]);
    let and_op = operator(&["and"]);
    let or_op = operator(&["or"]);

    let expr = reference();
    let atom_ref = reference();

    let atom = lalternative(rules![
        literal(),
        field_ref(&expr, &identifier),
        between("(", strip(&expr), ")").attach("paren"),
        sequence(rules![strip(skip_token("-")), &atom_ref]).attach("negate"),
    ]);
    atom_ref.set_target(&atom);

    let arguments = lbetween("(", delimited_sequence(0, strip(&expr), skip_token(",")), ")");
    let call = lalternative(rules![
        sequence(rules![&atom, lift(arguments)]).attach("call"),
        &atom
    ]);
    let math = oper(oper(&call, &mul_op), &add_op);
    let comparison = oper(&math, &rel_op);
    let logical = oper(oper(&comparison, &and_op), &or_op);

    let conditional = sequence(rules![
        &logical,
        loptional(lsequence(rules![sskip("if"), &logical, sskip("else"), &expr]))
    ])
    .attach("if");
    expr.set_target(&conditional);
    strip(&conditional)
}

fn tagged(tag: &'static str, text: Option<&str>, children: Vec<NodeMatcher>) -> NodeMatcher {
    node(Some(Attachment::new(tag)), text, children)
}

fn token(tag: &'static str, text: &str) -> NodeMatcher {
    tagged(tag, Some(text), vec![])
}

fn op(text: &'static str) -> NodeMatcher {
    token(text, text)
}

fn expr(children: Vec<NodeMatcher>) -> NodeMatcher {
    tagged("if", None, children)
}

fn reference_to(parts: Vec<NodeMatcher>) -> NodeMatcher {
    tagged("reference", None, parts)
}

fn field(name: &str) -> NodeMatcher {
    token("field", name)
}

fn assert_parses(input: &str, expected: NodeMatcher) {
    let tree = parse(&expression(), input).unwrap_or_else(|e| panic!("{:?}: {}", input, e));
    if let Err(error) = assert_matches(&expected, [tree.clone()]) {
        panic!("{:?}: {}\n{}", input, error, tree.dump());
    }
}

#[test]
fn test_arithmetic_precedence() {
    assert_parses(
        "1 + 2 * 3",
        expr(vec![tagged(
            "oper",
            None,
            vec![
                token("long", "1"),
                op("+"),
                tagged("oper", None, vec![token("long", "2"), op("*"), token("long", "3")]),
            ],
        )]),
    );
}

#[test]
fn test_relational_operators() {
    for rel in ["==", "!=", "<=", "<", ">=", ">"] {
        assert_parses(
            &format!("a {} b", rel),
            expr(vec![tagged(
                "oper",
                None,
                vec![
                    reference_to(vec![field("a")]),
                    op(rel),
                    reference_to(vec![field("b")]),
                ],
            )]),
        );
    }
}

#[test]
fn test_logical_operators_bind_loosest() {
    assert_parses(
        "x < 1 or y and z",
        expr(vec![tagged(
            "oper",
            None,
            vec![
                tagged(
                    "oper",
                    None,
                    vec![reference_to(vec![field("x")]), op("<"), token("long", "1")],
                ),
                op("or"),
                tagged(
                    "oper",
                    None,
                    vec![
                        reference_to(vec![field("y")]),
                        op("and"),
                        reference_to(vec![field("z")]),
                    ],
                ),
            ],
        )]),
    );
}

#[test]
fn test_field_references() {
    assert_parses(
        "x.items[0]",
        expr(vec![reference_to(vec![
            field("x"),
            field("items"),
            tagged("index", None, vec![expr(vec![token("long", "0")])]),
        ])]),
    );
}

#[test]
fn test_calls() {
    assert_parses(
        "f(1, g())",
        expr(vec![tagged(
            "call",
            None,
            vec![
                reference_to(vec![field("f")]),
                expr(vec![token("long", "1")]),
                expr(vec![tagged("call", None, vec![reference_to(vec![field("g")])])]),
            ],
        )]),
    );
}

#[test]
fn test_keywords_need_a_word_boundary() {
    assert_parses("true", expr(vec![token("true", "true")]));
    assert_parses("null", expr(vec![token("null", "null")]));
    assert_parses("trueish", expr(vec![reference_to(vec![field("trueish")])]));
}

#[test]
fn test_strings_and_negation() {
    assert_parses(
        "-x if y else 'z'",
        expr(vec![
            tagged("negate", None, vec![reference_to(vec![field("x")])]),
            reference_to(vec![field("y")]),
            expr(vec![token("string", "z")]),
        ]),
    );
    assert_parses(
        r#"("a" + 'b')"#,
        expr(vec![tagged(
            "paren",
            None,
            vec![expr(vec![tagged(
                "oper",
                None,
                vec![token("string", "a"), op("+"), token("string", "b")],
            )])],
        )]),
    );
}

#[test]
fn test_find_operands_by_parent() {
    let tree = parse(&expression(), "a * (b + c)").unwrap();
    let root = Path::from_root(tree);
    let inner = find_first_bf(&for_parent(attachment("paren")), &root).unwrap();
    assert_eq!(inner.depth(), 3);
    assert!(assert_matches(&attachment("if"), inner.nodes().to_vec()).is_ok());
}

#[test]
fn test_incomplete_input() {
    match parse(&expression(), "1 +") {
        Err(ParseError::RemainingInput { remaining, position, .. }) => {
            assert_eq!(remaining, "+");
            assert_eq!(position, 2);
        }
        other => panic!("expected remaining input, got {:?}", other),
    }
    assert!(parse(&expression(), "f(1,").is_err());
}

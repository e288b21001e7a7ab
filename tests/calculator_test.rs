mod common;

use jamon::chars;
use jamon::matcher::{assert_matches, attachment, node, value, NodeMatcher};
use jamon::parser::prelude::*;
use jamon::parser::{parse, Parser, Reference};
use jamon::{rules, Attachment, Node};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Calc {
    Expr,
    Literal,
    Negate,
    Mul,
    Div,
    Add,
    Sub,
}

fn eval(node: &Node) -> i64 {
    match node.attachment_as::<Calc>() {
        Some(Calc::Literal) => node
            .value()
            .and_then(|v| v.parse().ok())
            .expect("literal value"),
        Some(Calc::Negate) => -eval(node.first_child().expect("negated operand")),
        Some(Calc::Expr) => {
            let mut children = node.children().iter();
            let mut result = eval(children.next().expect("first operand"));
            while let (Some(op), Some(operand)) = (children.next(), children.next()) {
                result = reduce(op, result, eval(operand));
            }
            result
        }
        other => panic!("{:?} does not evaluate: {}", other, node),
    }
}

fn reduce(op: &Node, first: i64, second: i64) -> i64 {
    match op.attachment_as::<Calc>() {
        Some(Calc::Mul) => first * second,
        Some(Calc::Div) => first / second,
        Some(Calc::Add) => first + second,
        Some(Calc::Sub) => first - second,
        other => panic!("{:?} does not reduce: {}", other, op),
    }
}

fn operators() -> (Parser, Parser) {
    let mul_op = strip(lalternative([
        exact("*").attach(Calc::Mul),
        exact("/").attach(Calc::Div),
    ]));
    let add_op = strip(lalternative([
        exact("+").attach(Calc::Add),
        exact("-").attach(Calc::Sub),
    ]));
    (mul_op, add_op)
}

fn atom(expr: &Reference) -> Parser {
    let atom = reference();
    let parser = lalternative(rules![
        matches1(chars::digit()).attach(Calc::Literal),
        sequence(rules![skip_token("("), strip(expr), skip_token(")")]).attach(Calc::Expr),
        sequence(rules![strip(skip_token("-")), &atom]).attach(Calc::Negate),
    ]);
    atom.set_target(&parser);
    parser
}

fn simple_calculator() -> Parser {
    let expr = reference();
    let (mul_op, add_op) = operators();
    let atom = atom(&expr);

    let term = delimited_sequence(1, &atom, &mul_op).attach(Calc::Expr);
    let sum = delimited_sequence(1, &term, &add_op).attach(Calc::Expr);
    expr.set_target(&sum);
    strip(&sum)
}

fn calculator() -> Parser {
    let expr = reference();
    let (mul_op, add_op) = operators();
    let atom = atom(&expr);

    let term = lalternative(rules![
        delimited_sequence(2, &atom, &mul_op).attach(Calc::Expr),
        &atom
    ]);
    let sum = lalternative(rules![
        delimited_sequence(2, &term, &add_op).attach(Calc::Expr),
        &term,
        &atom
    ]);
    expr.set_target(&sum);
    strip(&sum)
}

const CASES: &[(&str, i64)] = &[
    ("0", 0),
    ("1", 1),
    (" 0 ", 0),
    (" -1 * 2 ", -2),
    ("1*2", 2),
    ("2*2", 4),
    ("2/2", 1),
    ("3*2/3", 2),
    ("1+1", 2),
    ("(1+1)*0", 0),
    ("1+1*0", 1),
    ("2*2+3*3", 13),
    ("2*-(-2+-3)*3", 30),
    ("1-1", 0),
    ("1--1", 2),
    ("1+1-1", 1),
];

fn assert_cases(parser: &Parser) {
    for (input, expected) in CASES {
        let tree = parse(parser, input).unwrap_or_else(|e| panic!("{:?}: {}", input, e));
        assert_eq!(eval(&tree), *expected, "evaluating {:?}", input);
    }
}

#[test]
fn test_simple_calculator() {
    assert_cases(&simple_calculator());
}

#[test]
fn test_calculator() {
    assert_cases(&calculator());
}

fn tagged(tag: Calc, text: Option<&str>, children: Vec<NodeMatcher>) -> NodeMatcher {
    node(Some(Attachment::new(tag)), text, children)
}

fn literal(text: &str) -> NodeMatcher {
    tagged(Calc::Literal, Some(text), vec![])
}

#[test]
fn test_simple_calculator_tree() {
    let tree = parse(&simple_calculator(), "1+2*3").unwrap();
    let expected = tagged(
        Calc::Expr,
        None,
        vec![
            tagged(Calc::Expr, None, vec![literal("1")]),
            tagged(Calc::Add, Some("+"), vec![]),
            tagged(
                Calc::Expr,
                None,
                vec![literal("2"), tagged(Calc::Mul, Some("*"), vec![]), literal("3")],
            ),
        ],
    );
    assert_matches(&expected, [tree]).unwrap();
}

#[test]
fn test_calculator_tree_collapses_single_terms() {
    let tree = parse(&calculator(), "-(4)").unwrap();
    let expected = tagged(
        Calc::Negate,
        None,
        vec![tagged(Calc::Expr, None, vec![literal("4")])],
    );
    assert_matches(&expected, [tree.clone()]).unwrap();
    assert_eq!(eval(&tree), -4);
    assert!(assert_matches(&attachment(Calc::Literal), [tree]).is_err());
}

#[test]
fn test_operator_nodes_keep_their_token() {
    let tree = parse(&calculator(), "8 / 2").unwrap();
    let op = tree.children()[1].clone();
    assert_matches(&value("/"), [tree, op]).unwrap();
}

#[test]
fn test_malformed_expressions() {
    let parser = calculator();
    for input in ["", "1+", "(1", "1 2", "*"] {
        let error = parse(&parser, input).unwrap_err();
        assert!(error.is_recoverable(), "{:?} failed with {}", input, error);
    }
}

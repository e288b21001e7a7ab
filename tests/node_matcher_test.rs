mod common;

use std::rc::Rc;
use std::str::FromStr;

use jamon::chars;
use jamon::matcher::{
    and, assert_matches, attachment, child_count, empty, find_first, for_each_child, for_parent,
    match_path, or, test_attachment, test_value, traverse, value, Path, PathVisitor,
    TraversalOrder,
};
use jamon::parser::parse;
use jamon::parser::prelude::*;
use jamon::{rules, Error, Node, PathError};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct ValueLister {
    values: Vec<String>,
}

impl PathVisitor for ValueLister {
    fn visit(&mut self, path: &Path) -> bool {
        self.values.push(path.to_string());
        true
    }
}

/// `a(b, c(d))` built from a grammar of nested lists.
fn parsed_tree() -> Rc<Node> {
    let list = reference();
    let word = matches1(chars::letter()).attach("word");
    let item = lalternative(rules![&list, &word]);
    let body = lbetween("(", delimited_by(0, strip(&item), ","), ")");
    let named = sequence(rules![&word, lift(body)]).attach("list");
    list.set_target(&named);
    parse(&list, "a(b, c(d))").unwrap()
}

#[test]
fn test_custom_visitor() {
    let tree = parsed_tree();
    let mut lister = ValueLister::default();
    traverse(
        TraversalOrder::from_str("depth_first").unwrap(),
        &Path::from_root(tree),
        &mut lister,
    );
    assert_eq!(
        lister.values,
        vec!["null", "null/a", "null/b", "null/null", "null/null/c", "null/null/d"]
    );
}

#[test]
fn test_matching_parsed_structure() {
    let tree = parsed_tree();
    let root = Path::from_root(tree.clone());

    let words_or_lists = for_each_child(or([attachment("word"), attachment("list")]));
    assert!(match_path(&and([attachment("list"), child_count(3), words_or_lists]), &root));

    let lowercase = test_value("lowercase", |v| {
        v.is_some_and(|v| v.chars().all(char::is_lowercase))
    });
    let word = find_first(
        TraversalOrder::BreadthFirst,
        &and([attachment("word"), lowercase]),
        &root,
    )
    .unwrap();
    assert_eq!(word.leaf().value(), Some("a"));

    let inner = find_first(
        TraversalOrder::DepthFirst,
        &and([value("d"), for_parent(attachment("list"))]),
        &root,
    )
    .unwrap();
    assert_eq!(inner.depth(), 2);
    assert_eq!(inner.for_parent().unwrap().leaf().children().len(), 2);

    let tagged = test_attachment("tagged", |a| a.is_some());
    assert!(match_path(&for_each_child(tagged), &root));
}

#[test]
fn test_empty_nodes() {
    let blank = Node::builder().build();
    assert!(match_path(&empty(), &Path::from_root(blank)));
    assert!(!match_path(&empty(), &Path::from_root(Node::leaf("x"))));
}

#[test]
fn test_assert_matches_reports_paths() {
    let tree = parsed_tree();
    let first = tree.children()[0].clone();

    assert!(assert_matches(&value("a"), [tree.clone(), first.clone()]).is_ok());
    match assert_matches(&value("z"), [tree.clone(), first.clone()]) {
        Err(Error::Unmatched(message)) => assert!(message.contains("null/a"), "{}", message),
        other => panic!("expected unmatched, got {:?}", other),
    }
    match assert_matches(&value("a"), [first, tree]) {
        Err(Error::Path(PathError::Broken { index })) => assert_eq!(index, 1),
        other => panic!("expected broken path, got {:?}", other),
    }
}

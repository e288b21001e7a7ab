use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::node_matcher::NodeMatcher;
use super::path::Path;
use crate::error::Error;
use crate::node::Node;

type MatchMemo = Rc<RefCell<HashMap<(Path, NodeMatcher), bool>>>;

/// A position in a tree, plus the memo shared by every context derived from
/// the same match.
#[derive(Debug, Clone)]
pub struct MatchContext {
    path: Path,
    memo: MatchMemo,
}

impl MatchContext {
    /// A context with a fresh memo.
    pub fn new(path: Path) -> Self {
        Self {
            path,
            memo: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A context for another path, sharing this context's memo.
    pub fn at(&self, path: Path) -> MatchContext {
        MatchContext {
            path,
            memo: Rc::clone(&self.memo),
        }
    }

    pub(crate) fn for_child(&self, child: &Rc<Node>) -> MatchContext {
        self.at(self.path.for_child_unchecked(Rc::clone(child)))
    }

    pub(crate) fn for_parent(&self) -> Option<MatchContext> {
        self.path.for_parent().map(|parent| self.at(parent))
    }

    /// Number of (path, matcher) results remembered so far.
    pub fn memo_len(&self) -> usize {
        self.memo.borrow().len()
    }

    /// Evaluates `matcher` at this context's leaf, reusing a remembered result
    /// for the same path and matcher.
    ///
    /// # Panics
    ///
    /// Panics if a result is remembered twice with different outcomes.
    pub fn matches(&self, matcher: &NodeMatcher) -> bool {
        let key = (self.path.clone(), matcher.clone());
        let cached = self.memo.borrow().get(&key).copied();
        if let Some(result) = cached {
            tracing::trace!(target: "jamon::match", path = %self.path, %matcher, result, "memo hit");
            return result;
        }

        let result = matcher.evaluate(self);
        let previous = self.memo.borrow_mut().insert(key, result);
        if let Some(previous) = previous {
            assert_eq!(
                previous, result,
                "inconsistent match memo for {} at {}",
                matcher, self.path
            );
        }
        result
    }
}

/// Evaluates `matcher` against the leaf of `path` in a fresh context.
pub fn match_path(matcher: &NodeMatcher, path: &Path) -> bool {
    MatchContext::new(path.clone()).matches(matcher)
}

/// Builds a path from `nodes` and fails unless `matcher` matches its leaf.
pub fn assert_matches<I>(matcher: &NodeMatcher, nodes: I) -> crate::Result<()>
where
    I: IntoIterator<Item = Rc<Node>>,
{
    let path = Path::new(nodes)?;
    if match_path(matcher, &path) {
        Ok(())
    } else {
        Err(Error::Unmatched(format!(
            "{} does not match the path {}",
            matcher, path
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathError;
    use crate::matcher::node_matcher::*;

    fn tree() -> Rc<Node> {
        Node::builder()
            .value("list")
            .children((0..4).map(|i| Node::leaf(i.to_string())))
            .build()
    }

    #[test]
    fn test_memo_is_shared_between_derived_contexts() {
        let root = tree();
        let context = MatchContext::new(Path::from_root(root.clone()));
        let digit = test_value("digit", |v| {
            v.map_or(false, |v| v.chars().all(|c| c.is_ascii_digit()))
        });
        assert!(context.matches(&for_each_child(digit.clone())));
        // the matcher itself and one entry per child
        assert_eq!(context.memo_len(), 5);

        let child = context.at(context.path().for_child(&root.children()[2]).unwrap());
        assert!(child.matches(&digit));
        assert_eq!(child.memo_len(), 5);
    }

    #[test]
    fn test_and_or_short_circuit() {
        let context = MatchContext::new(Path::from_root(tree()));
        assert!(!context.matches(&and([child_count(3), value("list")])));
        // value("list") was never evaluated
        assert_eq!(context.memo_len(), 2);
        assert!(context.matches(&or([value("list"), child_count(3)])));
        assert_eq!(context.memo_len(), 4);
    }

    #[test]
    fn test_assert_matches() {
        let root = tree();
        assert!(assert_matches(&child_count(4), vec![root.clone()]).is_ok());
        let second = root.children()[1].clone();
        assert!(assert_matches(&value("1"), vec![root.clone(), second]).is_ok());

        match assert_matches(&value("x"), vec![root.clone()]) {
            Err(Error::Unmatched(message)) => assert!(message.contains("value(\"x\")")),
            other => panic!("expected unmatched, got {:?}", other),
        }
        assert!(matches!(
            assert_matches(&value("x"), vec![root, Node::leaf("x")]),
            Err(Error::Path(PathError::Broken { index: 1 }))
        ));
    }
}

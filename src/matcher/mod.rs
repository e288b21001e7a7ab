//! # Tree Verification
//!
//! Declarative checks over parse trees. A [`NodeMatcher`] is evaluated at the
//! leaf of a [`Path`]; results are memoized per (path, matcher) for the
//! duration of one match or search, so combined matchers stay cheap on large
//! trees.
//!
//! ```ignore
//! use jamon::matcher::*;
//!
//! let list = and([value("list"), for_each_child(child_count(0))]);
//! assert_matches(&list, [tree.clone()])?;
//! let first_number = find_first_df(&attachment(Kind::Number), &Path::from_root(tree));
//! ```

pub mod context;
pub mod node_matcher;
pub mod path;
pub mod traversal;

pub use context::{assert_matches, match_path, MatchContext};
pub use node_matcher::{
    and, attachment, attachment_of, child_count, children, empty, for_each_child, for_parent,
    no_attachment, no_value, node, or, test_attachment, test_value, value, value_of, NodeMatcher,
    NodePredicate,
};
pub use path::Path;
pub use traversal::{
    find_first, find_first_bf, find_first_df, traverse, traverse_breadth_first,
    traverse_depth_first, PathVisitor, TraversalOrder,
};

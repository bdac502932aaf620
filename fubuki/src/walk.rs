//! Producers that yield from inside ordinary traversal code.

use crate::yield_;

/// Node of a binary tree of integers.
#[derive(Debug)]
pub struct TreeNode
{
    /// Value yielded for this node.
    pub value: i32,

    /// Subtree visited before this node.
    pub left: Option<Box<TreeNode>>,

    /// Subtree visited after this node.
    pub right: Option<Box<TreeNode>>,
}

impl TreeNode
{
    /// Node with the given children.
    pub fn new(
        left:  Option<Box<TreeNode>>,
        right: Option<Box<TreeNode>>,
        value: i32,
    ) -> Box<Self>
    {
        Box::new(Self{value, left, right})
    }

    /// Node without children.
    pub fn leaf(value: i32) -> Box<Self>
    {
        Self::new(None, None, value)
    }

    /// The tree whose in-order traversal is `8, 6, 2, 9, 7, 1, 5`.
    pub fn sample() -> Box<Self>
    {
        Self::new(
            Some(Self::leaf(8)),
            Some(Self::new(
                Some(Self::new(Some(Self::leaf(2)), Some(Self::leaf(7)), 9)),
                Some(Self::leaf(5)),
                1,
            )),
            6,
        )
    }
}

/// Yield every value of the tree, in order.
///
/// Recursion depth equals the depth of the tree;
/// each value is yielded from the frame of its own node.
pub fn walk_tree(node: &TreeNode)
{
    if let Some(left) = &node.left {
        walk_tree(left);
    }
    yield_(node.value);
    if let Some(right) = &node.right {
        walk_tree(right);
    }
}

/// Yield every item, in order.
pub fn walk_list<I>(items: I)
    where I: IntoIterator, I::Item: 'static
{
    for item in items {
        yield_(item);
    }
}

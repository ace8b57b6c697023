use std::collections::HashMap;

use generational_arena::{Arena, Index};
use rust_decimal::Decimal;
use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::AllocationNode;
use crate::domain::error::{DomainError, DomainResult};

/// Tree node in the arena-based allocation hierarchy.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Allocation payload for this node
    pub data: AllocationNode,
    /// Index of parent node in the arena, None for top-level nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in display order
    pub children: Vec<Index>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-based ordered forest of allocation nodes.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Top-level nodes keep their insertion order; ids are indexed for lookup.
#[derive(Debug, Clone, Default)]
pub struct AllocationArena {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Indices of depth-0 nodes, in order
    roots: Vec<Index>,
    /// Node id to arena index
    ids: HashMap<String, Index>,
}

impl AllocationArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node below `parent`, or as a new top-level node.
    ///
    /// Id uniqueness is the builder's responsibility; a duplicate id here
    /// would shadow the earlier node in the lookup index.
    #[instrument(level = "trace", skip(self, data), fields(id = %data.id))]
    pub fn insert_node(&mut self, data: AllocationNode, parent: Option<Index>) -> Index {
        let id = data.id.clone();
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.roots.push(node_idx);
        }
        self.ids.insert(id, node_idx);

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn find(&self, id: &str) -> Option<Index> {
        self.ids.get(id).copied()
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Sum of the current values of `idx`'s immediate children.
    ///
    /// Fails with `ArithmeticOverflow` naming the parent when the sum does not fit.
    pub fn children_total(&self, idx: Index) -> DomainResult<Decimal> {
        let Some(node) = self.get_node(idx) else {
            return Ok(Decimal::ZERO);
        };
        node.children
            .iter()
            .filter_map(|&child| self.get_node(child))
            .try_fold(Decimal::ZERO, |acc, child| {
                acc.checked_add(child.data.value)
                    .ok_or_else(|| DomainError::ArithmeticOverflow(node.data.id.clone()))
            })
    }

    /// Pre-order traversal of the whole forest, with depth.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Post-order traversal (children before parents) of the whole forest.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Post-order indices, collected so the caller may mutate while walking.
    pub fn postorder_indices(&self) -> Vec<Index> {
        self.iter_postorder().map(|(idx, _)| idx).collect()
    }

    /// Render the forest as a `termtree`, one line per node.
    pub fn to_tree_string(&self, title: &str, render: impl Fn(&AllocationNode) -> String) -> Tree<String> {
        fn build_tree(
            arena: &AllocationArena,
            node_idx: Index,
            render: &dyn Fn(&AllocationNode) -> String,
        ) -> Option<Tree<String>> {
            let node = arena.get_node(node_idx)?;
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|&child| build_tree(arena, child, render))
                .collect();
            Some(Tree::new(render(&node.data)).with_leaves(leaves))
        }

        let leaves: Vec<_> = self
            .roots
            .iter()
            .filter_map(|&root| build_tree(self, root, &render))
            .collect();
        Tree::new(title.to_string()).with_leaves(leaves)
    }
}

pub struct TreeIterator<'a> {
    arena: &'a AllocationArena,
    stack: Vec<(Index, usize)>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a AllocationArena) -> Self {
        // Push roots in reverse order for left-to-right traversal
        let stack = arena.roots.iter().rev().map(|&root| (root, 0)).collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, depth)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                for &child in node.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((current_idx, depth, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a AllocationArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a AllocationArena) -> Self {
        let stack = arena.roots.iter().rev().map(|&root| (root, false)).collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

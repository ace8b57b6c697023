//! Tree builder: constructs an allocation arena from a snapshot.

use std::collections::HashSet;

use generational_arena::Index;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::domain::arena::AllocationArena;
use crate::domain::entities::{AllocationNode, SnapshotNode};
use crate::domain::error::{DomainError, DomainResult};

/// Constructs allocation trees from caller-supplied snapshots.
///
/// Leaves must carry a value. Internal nodes may omit it; a declared value
/// must match the sum of the children. Baselines default to the node's value.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    seen_ids: HashSet<String>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "debug", skip(self, nodes), fields(roots = nodes.len()))]
    pub fn build(&mut self, nodes: &[SnapshotNode]) -> DomainResult<AllocationArena> {
        self.seen_ids.clear();
        self.check_ids(nodes)?;

        let mut tree = AllocationArena::new();
        for node in nodes {
            self.insert_subtree(&mut tree, node, None)?;
        }
        debug!("built allocation tree with {} nodes", tree.len());
        Ok(tree)
    }

    fn check_ids(&mut self, nodes: &[SnapshotNode]) -> DomainResult<()> {
        let mut stack: Vec<&SnapshotNode> = nodes.iter().collect();
        while let Some(node) = stack.pop() {
            if node.id.trim().is_empty() {
                return Err(DomainError::EmptyId);
            }
            if !self.seen_ids.insert(node.id.clone()) {
                return Err(DomainError::DuplicateId(node.id.clone()));
            }
            stack.extend(node.children.iter());
        }
        Ok(())
    }

    /// Insert `node` and its descendants, returning the node's resolved value.
    fn insert_subtree(
        &self,
        tree: &mut AllocationArena,
        node: &SnapshotNode,
        parent: Option<Index>,
    ) -> DomainResult<Decimal> {
        let label = node.label.clone().unwrap_or_else(|| node.id.clone());
        let provisional = node.value.unwrap_or(Decimal::ZERO);
        let idx = tree.insert_node(
            AllocationNode::new(node.id.clone(), label, provisional, Decimal::ZERO),
            parent,
        );

        let value = if node.children.is_empty() {
            node.value
                .ok_or_else(|| DomainError::MissingValue(node.id.clone()))?
        } else {
            let mut computed = Decimal::ZERO;
            for child in &node.children {
                let child_value = self.insert_subtree(tree, child, Some(idx))?;
                computed = computed
                    .checked_add(child_value)
                    .ok_or_else(|| DomainError::ArithmeticOverflow(node.id.clone()))?;
            }
            match node.value {
                Some(declared) if declared != computed => {
                    return Err(DomainError::InconsistentTotal {
                        id: node.id.clone(),
                        declared,
                        computed,
                    })
                }
                _ => computed,
            }
        };

        let baseline = node.baseline.unwrap_or(value);
        if let Some(entry) = tree.get_node_mut(idx) {
            entry.data = AllocationNode::new(entry.data.id.clone(), entry.data.label.clone(), value, baseline);
        }
        Ok(value)
    }
}

//! Allocation engine: distribution, rollup and variance over an allocation tree.
//!
//! Every mutating operation runs against a copy of the arena and replaces the
//! live tree only when it succeeds, so a failed edit leaves no trace.

use generational_arena::Index;
use rust_decimal::Decimal;
use termtree::Tree;
use tracing::{debug, instrument, trace};

use crate::domain::arena::AllocationArena;
use crate::domain::builder::TreeBuilder;
use crate::domain::entities::{Adjustment, AllocationNode, AllocationPolicy, AllocationRow, DistributionDepth, SnapshotNode};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::variance::node_variance;

/// Owns an allocation tree and keeps it consistent across edits.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    tree: AllocationArena,
    policy: AllocationPolicy,
}

impl AllocationEngine {
    /// Build an engine from a snapshot with the default policy.
    pub fn from_snapshot(nodes: &[SnapshotNode]) -> DomainResult<Self> {
        Self::with_policy(nodes, AllocationPolicy::default())
    }

    /// Build an engine from a snapshot and compute every node's variance.
    pub fn with_policy(nodes: &[SnapshotNode], policy: AllocationPolicy) -> DomainResult<Self> {
        let tree = TreeBuilder::new().build(nodes)?;
        let mut engine = Self { tree, policy };
        engine.rollup()?;
        Ok(engine)
    }

    pub fn tree(&self) -> &AllocationArena {
        &self.tree
    }

    pub fn apply(&mut self, id: &str, adjustment: Adjustment) -> DomainResult<()> {
        match adjustment {
            Adjustment::Absolute(value) => self.apply_absolute(id, value),
            Adjustment::PercentageDelta(percent) => self.apply_percentage_delta(id, percent),
        }
    }

    /// Replace the value of node `id`, distributing onto its children if it has any.
    #[instrument(level = "debug", skip(self))]
    pub fn apply_absolute(&mut self, id: &str, new_value: Decimal) -> DomainResult<()> {
        let idx = self.locate(id)?;
        self.commit(id, idx, new_value)
    }

    /// Scale node `id` by `1 + percent / 100` of its current value.
    #[instrument(level = "debug", skip(self))]
    pub fn apply_percentage_delta(&mut self, id: &str, percent: Decimal) -> DomainResult<()> {
        let idx = self.locate(id)?;
        let current = self
            .tree
            .get_node(idx)
            .map(|n| n.data.value)
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))?;
        let new_value = percent
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|p| Decimal::ONE.checked_add(p))
            .and_then(|factor| current.checked_mul(factor))
            .ok_or_else(|| DomainError::ArithmeticOverflow(id.to_string()))?;
        debug!(%current, %new_value, "percentage delta resolved");
        self.commit(id, idx, new_value)
    }

    /// Recompute internal values bottom-up and every variance.
    ///
    /// Idempotent: a second run without an intervening edit changes nothing.
    #[instrument(level = "debug", skip(self))]
    pub fn rollup(&mut self) -> DomainResult<()> {
        let mut work = self.tree.clone();
        rollup_tree(&mut work)?;
        self.tree = work;
        Ok(())
    }

    fn locate(&self, id: &str) -> DomainResult<Index> {
        self.tree
            .find(id)
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))
    }

    fn commit(&mut self, id: &str, idx: Index, new_value: Decimal) -> DomainResult<()> {
        let mut work = self.tree.clone();
        let is_leaf = work
            .get_node(idx)
            .map(|n| n.is_leaf())
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))?;
        if is_leaf {
            if let Some(node) = work.get_node_mut(idx) {
                node.data.value = new_value;
            }
        } else {
            distribute(&mut work, idx, new_value, &self.policy)?;
        }
        rollup_tree(&mut work)?;
        self.tree = work;
        Ok(())
    }

    pub fn node(&self, id: &str) -> DomainResult<&AllocationNode> {
        let idx = self.locate(id)?;
        self.tree
            .get_node(idx)
            .map(|n| &n.data)
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))
    }

    pub fn value(&self, id: &str) -> DomainResult<Decimal> {
        self.node(id).map(|n| n.value)
    }

    /// Variance of node `id`; `DivisionByZero` if its baseline is zero.
    pub fn variance(&self, id: &str) -> DomainResult<Decimal> {
        let node = self.node(id)?;
        node_variance(&node.id, node.value, node.baseline())
    }

    /// Depth-annotated pre-order rows for renderers.
    pub fn rows(&self) -> Vec<AllocationRow> {
        self.tree
            .iter()
            .map(|(_, depth, node)| AllocationRow {
                id: node.data.id.clone(),
                label: node.data.label.clone(),
                value: node.data.value,
                baseline: node.data.baseline(),
                variance: node.data.variance,
                depth,
                has_children: !node.is_leaf(),
            })
            .collect()
    }

    /// Sum of all top-level values, recomputed on every call.
    pub fn grand_total(&self) -> DomainResult<Decimal> {
        self.tree
            .roots()
            .iter()
            .filter_map(|&root| self.tree.get_node(root))
            .try_fold(Decimal::ZERO, |acc, node| {
                acc.checked_add(node.data.value)
                    .ok_or_else(|| DomainError::ArithmeticOverflow("grand total".to_string()))
            })
    }

    /// Current state as a snapshot, with baselines made explicit.
    pub fn snapshot(&self) -> Vec<SnapshotNode> {
        fn export(tree: &AllocationArena, idx: Index) -> Option<SnapshotNode> {
            let node = tree.get_node(idx)?;
            Some(SnapshotNode {
                id: node.data.id.clone(),
                label: Some(node.data.label.clone()),
                value: Some(node.data.value),
                baseline: Some(node.data.baseline()),
                children: node.children.iter().filter_map(|&c| export(tree, c)).collect(),
            })
        }

        self.tree
            .roots()
            .iter()
            .filter_map(|&root| export(&self.tree, root))
            .collect()
    }

    pub fn to_tree_string(&self, title: &str) -> Tree<String> {
        self.tree.to_tree_string(title, |node| match node.variance {
            Some(variance) => format!("{}: {:.2} ({:.2}%)", node.label, node.value, variance),
            None => format!("{}: {:.2} (n/a)", node.label, node.value),
        })
    }
}

/// Push `new_value` of internal node `idx` down onto its children proportionally.
#[instrument(level = "trace", skip(tree, policy))]
fn distribute(
    tree: &mut AllocationArena,
    idx: Index,
    new_value: Decimal,
    policy: &AllocationPolicy,
) -> DomainResult<()> {
    let (id, children) = match tree.get_node(idx) {
        Some(node) => (node.data.id.clone(), node.children.clone()),
        None => return Ok(()),
    };

    let total = tree.children_total(idx)?;
    if total.is_zero() {
        return Err(DomainError::EmptyDistributionBase(id));
    }
    let ratio = new_value
        .checked_div(total)
        .ok_or_else(|| DomainError::ArithmeticOverflow(id.clone()))?;
    trace!(%id, %total, %ratio, "distributing");

    for child_idx in children {
        let Some(child) = tree.get_node(child_idx) else {
            continue;
        };
        let child_id = child.data.id.clone();
        let scaled = child
            .data
            .value
            .checked_mul(ratio)
            .map(|v| policy.round(v))
            .ok_or_else(|| DomainError::ArithmeticOverflow(child_id.clone()))?;

        let descend = policy.distribution == DistributionDepth::Recursive
            && !child.is_leaf()
            && !tree.children_total(child_idx)?.is_zero();
        if descend {
            distribute(tree, child_idx, scaled, policy)?;
        } else if let Some(child) = tree.get_node_mut(child_idx) {
            child.data.value = scaled;
            child.data.variance = recorded_variance(&child.data)?;
        }
    }

    if let Some(node) = tree.get_node_mut(idx) {
        node.data.value = new_value;
        node.data.variance = recorded_variance(&node.data)?;
    }
    Ok(())
}

/// Post-order: internal values become the sum of their children, variances follow.
fn rollup_tree(tree: &mut AllocationArena) -> DomainResult<()> {
    for idx in tree.postorder_indices() {
        let is_leaf = tree.get_node(idx).map(|n| n.is_leaf()).unwrap_or(true);
        let total = if is_leaf { None } else { Some(tree.children_total(idx)?) };
        if let Some(node) = tree.get_node_mut(idx) {
            if let Some(total) = total {
                node.data.value = total;
            }
            node.data.variance = recorded_variance(&node.data)?;
        }
    }
    Ok(())
}

/// Variance as stored on a node: a zero baseline is recorded as undefined.
fn recorded_variance(node: &AllocationNode) -> DomainResult<Option<Decimal>> {
    match node_variance(&node.id, node.value, node.baseline()) {
        Ok(variance) => Ok(Some(variance)),
        Err(DomainError::DivisionByZero(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine() -> AllocationEngine {
        AllocationEngine::from_snapshot(&[SnapshotNode::branch(
            "electronics",
            "Electronics",
            vec![
                SnapshotNode::leaf("phones", "Phones", dec!(800)),
                SnapshotNode::leaf("laptops", "Laptops", dec!(700)),
            ],
        )])
        .unwrap()
    }

    #[test]
    fn given_fresh_engine_then_every_variance_is_zero() {
        let engine = engine();
        assert!(engine.rows().iter().all(|r| r.variance == Some(Decimal::ZERO)));
    }

    #[test]
    fn given_leaf_edit_when_committing_then_parent_is_resummed() {
        let mut engine = engine();
        engine.apply_absolute("laptops", dec!(500)).unwrap();
        assert_eq!(engine.value("electronics").unwrap(), dec!(1300));
    }

    #[test]
    fn given_failed_distribution_then_live_tree_is_untouched() {
        let mut engine = engine();
        engine.apply_absolute("electronics", Decimal::ZERO).unwrap();
        let before = engine.rows();

        let result = engine.apply_absolute("electronics", dec!(100));

        assert_eq!(result, Err(DomainError::EmptyDistributionBase("electronics".to_string())));
        assert_eq!(engine.rows(), before);
    }

    #[test]
    fn given_adjustment_when_applying_then_dispatches_to_operation() {
        let mut engine = engine();
        engine.apply("phones", Adjustment::PercentageDelta(dec!(-25))).unwrap();
        assert_eq!(engine.value("phones").unwrap(), dec!(600));
        engine.apply("phones", Adjustment::Absolute(dec!(1))).unwrap();
        assert_eq!(engine.value("electronics").unwrap(), dec!(701));
    }

    #[test]
    fn given_stale_index_when_committing_then_node_not_found() {
        let mut engine = engine();
        // one slot past the end of the engine's three-node arena
        let mut other = AllocationArena::new();
        for id in ["w", "x", "y"] {
            other.insert_node(AllocationNode::new(id, id, dec!(1), dec!(1)), None);
        }
        let stale = other.insert_node(AllocationNode::new("z", "z", dec!(1), dec!(1)), None);
        let before = engine.rows();

        let result = engine.commit("z", stale, dec!(5));

        assert_eq!(result, Err(DomainError::NodeNotFound("z".to_string())));
        assert_eq!(engine.rows(), before);
    }

    #[test]
    fn given_engine_when_rendering_tree_then_shows_values_and_variance() {
        let mut engine = engine();
        engine.apply_percentage_delta("phones", dec!(10)).unwrap();
        let rendered = engine.to_tree_string("budget").to_string();
        assert!(rendered.contains("Phones: 880"), "{rendered}");
        assert!(rendered.contains("(10.00%)"), "{rendered}");
    }
}

//! Domain entities: core data structures

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Payload of one node in the allocation tree.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationNode {
    /// Unique across the whole tree
    pub id: String,
    /// Display name, opaque to the engine
    pub label: String,
    /// Current amount
    pub value: Decimal,
    /// Amount fixed at construction; only readable
    baseline: Decimal,
    /// Percentage deviation from baseline, `None` while the baseline is zero
    pub variance: Option<Decimal>,
}

impl AllocationNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, value: Decimal, baseline: Decimal) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value,
            baseline,
            variance: None,
        }
    }

    pub fn baseline(&self) -> Decimal {
        self.baseline
    }
}

/// One node of a caller-supplied tree snapshot.
///
/// Used both to construct an engine and to export its current state.
/// `value` may be omitted on internal nodes, where it is derived from the children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn leaf(id: impl Into<String>, label: impl Into<String>, value: Decimal) -> Self {
        Self {
            id: id.into(),
            label: Some(label.into()),
            value: Some(value),
            baseline: None,
            children: Vec::new(),
        }
    }

    pub fn branch(id: impl Into<String>, label: impl Into<String>, children: Vec<SnapshotNode>) -> Self {
        Self {
            id: id.into(),
            label: Some(label.into()),
            value: None,
            baseline: None,
            children,
        }
    }

    pub fn with_baseline(mut self, baseline: Decimal) -> Self {
        self.baseline = Some(baseline);
        self
    }
}

/// Flattened, depth-annotated view of one node for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationRow {
    pub id: String,
    pub label: String,
    pub value: Decimal,
    pub baseline: Decimal,
    pub variance: Option<Decimal>,
    pub depth: usize,
    pub has_children: bool,
}

/// A value change requested for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Replace the current value
    Absolute(Decimal),
    /// Scale the current value by `1 + percent / 100`
    PercentageDelta(Decimal),
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::Absolute(v) => write!(f, "={}", v),
            Adjustment::PercentageDelta(p) if p.is_sign_negative() => write!(f, "{}%", p),
            Adjustment::PercentageDelta(p) => write!(f, "+{}%", p),
        }
    }
}

/// Rounding applied to distributed child amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rounding {
    /// 0.005 -> 0.01, -0.005 -> -0.01
    #[default]
    HalfAwayFromZero,
    /// Banker's rounding: 0.005 -> 0.00, 0.015 -> 0.02
    HalfEven,
}

impl Rounding {
    pub fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::HalfAwayFromZero => RoundingStrategy::MidpointAwayFromZero,
            Rounding::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// How far a distribution reaches below the edited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionDepth {
    /// Scale immediate children only; deeper descendants keep their amounts
    /// until rollup re-sums their ancestors.
    #[default]
    Immediate,
    /// Scale every descendant proportionally.
    Recursive,
}

/// Arithmetic policy of an allocation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationPolicy {
    pub decimal_places: u32,
    pub rounding: Rounding,
    pub distribution: DistributionDepth,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            rounding: Rounding::default(),
            distribution: DistributionDepth::default(),
        }
    }
}

impl AllocationPolicy {
    /// Round a distributed amount according to this policy.
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.decimal_places, self.rounding.strategy())
    }
}

//! Domain layer: allocation tree, recalculation engine and variance
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod engine;
pub mod entities;
pub mod error;
pub mod variance;

pub use arena::{AllocationArena, TreeNode};
pub use builder::TreeBuilder;
pub use engine::AllocationEngine;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use variance::variance;

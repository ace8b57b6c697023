//! rebudget: hierarchical budget allocation
//!
//! A tree of labeled amounts where a new value pushed onto any node is
//! distributed proportionally onto its children, rolled back up so that every
//! internal node equals the sum of its children, and compared against an
//! immutable baseline as a variance percentage.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

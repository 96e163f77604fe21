//! Core domain models
//!
//! This module defines the fundamental data structures that represent
//! pipelines, nodes, and the per-run output registry.

pub mod node;
pub mod outputs;
pub mod pipeline;
pub mod state;
pub mod vars;

pub use node::*;
pub use outputs::*;
pub use pipeline::*;
pub use state::*;

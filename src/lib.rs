//! Blockrise (workspace facade crate).
//!
//! Re-exports the member crates under one name so hosts can depend on a single package.

pub use blockrise_core as core;
pub use blockrise_runtime as runtime;
pub use blockrise_types as types;

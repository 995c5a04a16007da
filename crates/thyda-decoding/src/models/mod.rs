//! Reference model backends.
//!
//! Real neural runtimes implement [`crate::traits::Seq2SeqModel`] in their
//! own crates; what lives here is the deterministic, file-loadable backend
//! the CLI and the integration tests run against.

mod table;

pub use table::{TableModel, TableModelSpec};

//! Language-specific indexer implementations.

mod go;

pub use go::GoAnalyzer;

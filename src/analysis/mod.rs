//! Structural indexing of Go source units.
//!
//! This module turns source text into the facts the interface extractor
//! consumes:
//! - The package name
//! - Top-level declarations (interfaces with typed method signatures, constants)
//! - The import table
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Source Unit     │────▶│ GoAnalyzer   │────▶│ SourceFacts   │
//! └─────────────────┘     │ (tree-sitter)│     │ (Declarations,│
//!                         └──────────────┘     │  TypeRefs,    │
//!                                              │  Imports)     │
//!                                              └───────────────┘
//! ```
//!
//! Syntax errors anywhere in the tree are rejected rather than indexed
//! around, so the extractor never sees a partial unit.

mod facts;
mod languages;
mod traits;

pub use facts::{
    ConstValue, Declaration, Import, InterfaceElement, MethodSignature, Param, SourceFacts, Span,
    TypeRef,
};
pub use languages::GoAnalyzer;
pub use traits::{ParsedFile, SourceIndexer};

//! Core traits for source indexing.

use std::path::Path;

use super::SourceFacts;
use crate::error::GenerateError;

/// Holds a parsed tree-sitter tree and associated metadata.
///
/// This is kept separate from SourceFacts so the tree can be inspected
/// again without re-parsing.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The source bytes (kept for node text extraction).
    pub source: Vec<u8>,
    /// The file path label (for error reporting).
    pub path: String,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

/// Turns source text into the structural facts the extractor consumes.
///
/// # Thread Safety
///
/// tree_sitter::Parser is not Sync, so implementations create parsers
/// as needed.
pub trait SourceIndexer: Send + Sync {
    /// Returns the language identifier (e.g., "go").
    fn language_id(&self) -> &'static str;

    /// Parse a source unit into a tree-sitter tree.
    ///
    /// Fails only if the parser could not run at all. Syntax errors are
    /// reported by [`SourceIndexer::index`].
    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile>;

    /// Extract declarations, type references and the import table.
    ///
    /// A tree containing syntax errors is rejected.
    fn index(&self, parsed: &ParsedFile) -> Result<SourceFacts, GenerateError>;
}

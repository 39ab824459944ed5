//! Generation runner that drives indexing, extraction and synthesis.
//!
//! A source unit either produces a complete artifact or an error; nothing
//! is written until the artifact is fully rendered.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::analysis::{GoAnalyzer, SourceIndexer};
use crate::config::Config;
use crate::extract::{extract_targets, ServiceTarget};
use crate::generate::Synthesizer;

/// Label used in diagnostics for a unit read from standard input.
pub const STDIN_LABEL: &str = "STDIN";

/// Everything extracted from one source unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitDescriptor {
    pub package: String,
    pub targets: Vec<ServiceTarget>,
}

/// Outcome of a batch walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Artifacts written.
    pub generated: usize,
    /// Inputs skipped because of an I/O error.
    pub skipped: usize,
    /// Inputs matching an `excluded_paths` pattern.
    pub excluded: usize,
}

/// Runs generation for single units and directory trees.
pub struct Runner {
    config: Config,
    analyzer: GoAnalyzer,
    synthesizer: Synthesizer,
}

impl Runner {
    /// Create a runner for a resolved configuration.
    pub fn new(config: Config) -> Self {
        let synthesizer = Synthesizer::new(config.generator);
        Self {
            config,
            analyzer: GoAnalyzer::new(),
            synthesizer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Index a source unit and extract its targets.
    ///
    /// Rejections are returned as [`crate::error::GenerateError`] inside the
    /// `anyhow::Error`; any other error means the parser itself failed.
    pub fn describe(&self, label: &str, source: &[u8]) -> anyhow::Result<UnitDescriptor> {
        let parsed = self.analyzer.parse(Path::new(label), source)?;
        let facts = self.analyzer.index(&parsed)?;
        let targets = extract_targets(&facts)?;
        Ok(UnitDescriptor {
            package: facts.package,
            targets,
        })
    }

    /// Render the instrumentation artifact for a source unit.
    pub fn generate(&self, label: &str, source: &[u8]) -> anyhow::Result<String> {
        let unit = self.describe(label, source)?;
        Ok(self.synthesizer.render(&unit.package, &unit.targets))
    }

    /// Generate a sibling artifact for every input file under `root`.
    ///
    /// Files are visited in file-name order. An I/O error skips that file;
    /// a rejected unit aborts the walk.
    pub fn run_tree(&self, root: &Path) -> anyhow::Result<BatchSummary> {
        let mut summary = BatchSummary::default();

        for input in self.collect_inputs(root, &mut summary) {
            if self.config.is_path_excluded(&input) {
                tracing::debug!(path = %input.display(), "excluded");
                summary.excluded += 1;
                continue;
            }

            let source = match fs::read(&input) {
                Ok(source) => source,
                Err(e) => {
                    tracing::error!(path = %input.display(), error = %e, "failed to read input");
                    summary.skipped += 1;
                    continue;
                }
            };

            let artifact = self.generate(&input.to_string_lossy(), &source)?;

            let output = input.with_file_name(&self.config.output_file_name);
            match fs::write(&output, artifact) {
                Ok(()) => {
                    tracing::info!(path = %output.display(), "generated");
                    summary.generated += 1;
                }
                Err(e) => {
                    tracing::error!(path = %output.display(), error = %e, "failed to write artifact");
                    summary.skipped += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Walk `root` for files named like the configured input.
    fn collect_inputs(&self, root: &Path, summary: &mut BatchSummary) -> Vec<PathBuf> {
        let mut inputs = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::error!(error = %e, "failed to walk directory");
                    summary.skipped += 1;
                    continue;
                }
            };
            if entry.file_type().is_file()
                && entry.file_name().to_string_lossy() == self.config.input_file_name
            {
                inputs.push(entry.into_path());
            }
        }

        inputs
    }
}

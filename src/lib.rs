//! connect-instrument - OpenTelemetry decorators for connect-go clients.
//!
//! Reads a connect-go generated source unit, finds every `<Service>Client`
//! interface, and emits a Go file in the same package that wraps each client
//! in a decorator recording one span per RPC call.
//!
//! # Architecture
//!
//! - `analysis`: tree-sitter indexing of Go source into typed facts
//! - `extract`: client interface discovery and call shape matching
//! - `generate`: deterministic synthesis of the instrumentation unit
//! - `runner`: single-unit and directory-tree generation
//! - `config`: YAML config file schema
//! - `cli`, `logging`: binary front end
//!
//! # Example
//!
//! ```no_run
//! use connect_instrument::{Config, Runner};
//!
//! let source = std::fs::read("gen/ping/v1/pingv1connect/api.connect.go")?;
//! let artifact = Runner::new(Config::default()).generate("api.connect.go", &source)?;
//! print!("{}", artifact);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod generate;
pub mod logging;
pub mod runner;

pub use analysis::{GoAnalyzer, SourceFacts, SourceIndexer, TypeRef};
pub use config::Config;
pub use error::{GenerateError, ShapeError};
pub use extract::{extract_targets, CallShape, MethodTarget, ServiceTarget};
pub use generate::{SynthesisOptions, Synthesizer};
pub use runner::{BatchSummary, Runner, UnitDescriptor};

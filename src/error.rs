//! Errors raised while turning a source unit into a generated artifact.
//!
//! Every variant is terminal: the generator never emits partially
//! instrumented code.

use thiserror::Error;

use crate::analysis::Span;

/// Why a method signature does not have the enveloped call shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("expected 2 parameters, found {0}")]
    ParameterCount(usize),
    #[error("expected 2 results, found {0}")]
    ResultCount(usize),
    #[error("request parameter `{0}` is not a pointer to a single-argument envelope")]
    RequestNotEnveloped(String),
    #[error("first result `{0}` is not a pointer to a single-argument envelope")]
    ResponseNotEnveloped(String),
    #[error("second result `{0}` is not `error`")]
    MissingErrorSlot(String),
    #[error("embedded element `{0}` is not a method")]
    EmbeddedElement(String),
}

/// Errors that abort generation for a source unit.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("{path}:{span}: {message}")]
    Parse {
        path: String,
        span: Span,
        message: String,
    },
    #[error("{path}: missing package clause")]
    MissingPackage { path: String },
    #[error(
        "{path}:{span}: failed to parse interface method {interface}.{method}, \
         is the input file a connectrpc generation? {reason}"
    )]
    Shape {
        path: String,
        span: Span,
        interface: String,
        method: String,
        #[source]
        reason: ShapeError,
    },
    #[error("{path}: cannot resolve full service name for {interface}: {reason}")]
    ServiceName {
        path: String,
        interface: String,
        reason: String,
    },
    #[error("{path}: could not find connectrpc client interface")]
    NoTargets { path: String },
}

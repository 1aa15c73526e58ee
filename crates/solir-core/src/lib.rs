/*! Typed IR over solc ASTs for smart contract analysis.
 *
 * Detectors need more than the raw JSON the compiler hands back: they need to walk a contract
 * top-down, climb from an expression to its enclosing function, resolve identifiers to the
 * declarations they name, and ask cheap semantic questions such as "can this subtree write
 * storage?". This crate turns a standard-JSON AST into an arena-backed graph that answers those
 * questions, and maps every node back to line and column for reporting.
 */

#![cfg_attr(test, recursion_limit = "256")]

pub mod ast;
pub mod detection;
pub mod ir;
pub mod source_location;

pub use detection::{
    Detection, DetectionImpact, DetectorResult, LocatedDetection, RelatedLocation,
};
pub use ir::{
    GraphBuilder, IrGraph, Location, NodeCategory, NodeId, NodeKind, NodeRef, SourceUnitEntry,
    StateEffects, Traverse,
};
pub use source_location::{ByteRange, LineCol, LineIndex, SourceLocationError, SourceUnitId};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Protocol mismatch in source unit '{unit}': {message}")]
    ProtocolMismatch { unit: String, message: String },
    #[error("Source unit already loaded: {0}")]
    DuplicateSourceUnit(String),
    #[error("Unknown source unit: {0}")]
    UnknownSourceUnit(String),
    #[error("No source text loaded for source unit '{0}'")]
    MissingSourceText(String),
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    #[error(transparent)]
    SourceLocation(#[from] SourceLocationError),
}

pub type Result<T> = std::result::Result<T, IrError>;

/// Runs `f` with headroom on the stack, spilling onto a fresh segment when deep
/// ASTs would otherwise overflow it.
pub(crate) fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(64 * 1024, 1024 * 1024, f)
}

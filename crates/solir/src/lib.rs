/*! Unified interface from Solidity sources to a navigable IR.
 *
 * One import for the whole flow: resolve and install a compiler, build a standard-JSON request,
 * run it, and turn the response into an `IrGraph` detectors can walk.
 */

pub mod pipeline;

pub use solir_compiler as compiler;
pub use solir_core as core;
pub use solir_svm as svm;

pub use solir_compiler::{
    CompileOptions, CompilerError, DriverConfig, SolcDriver, SolcInput, SolcOutput,
    SourceDescriptor,
};
pub use solir_core::{
    Detection, DetectionImpact, DetectorResult, GraphBuilder, IrError, IrGraph, NodeKind, NodeRef,
    StateEffects,
};
pub use solir_svm::{SolcVersion, SolcVersionManager, SvmConfig, SvmError};

pub use pipeline::{build_graph, collect_sources, Compilation, Pipeline, PipelineError};

/*! The solc standard-JSON protocol and a driver that speaks it.
 *
 * The compiler is an external process with a strict wire schema on both ends. `input` models the
 * request exactly as solc spells it, `output` models the response, and `driver` runs one binary
 * against one request. Every wire struct keeps fields it does not recognise, so a request read
 * from disk can be re-emitted without losing anything newer compilers understand.
 */

pub mod driver;
pub mod input;
pub mod output;

pub use driver::{DriverConfig, SolcDriver};
pub use input::{
    CompileOptions, ContractSelector, EvmVersion, Language, OutputKind, OutputSelection, Settings,
    SolcInput, SourceDescriptor,
};
pub use output::{OutputContract, OutputError, OutputSource, Severity, SolcOutput};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("Invalid compiler input: {0}")]
    Validation(String),
    #[error("Compiler response does not match the standard-JSON schema: {0}")]
    ProtocolMismatch(String),
    #[error("solc exited with {status}: {stderr}")]
    Invocation { status: String, stderr: String },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CompilerError>;

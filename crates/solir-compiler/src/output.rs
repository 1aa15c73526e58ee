use crate::input::Extra;
use crate::{CompilerError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A `solc --standard-json` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolcOutput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<OutputError>,
    #[serde(default)]
    pub sources: IndexMap<String, OutputSource>,
    /// Source unit name, then contract name.
    #[serde(default)]
    pub contracts: IndexMap<String, IndexMap<String, OutputContract>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SolcOutput {
    /// Decodes a response of any nesting depth; deep ASTs grow the stack on demand.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mismatch = |e: serde_json::Error| CompilerError::ProtocolMismatch(e.to_string());
        let mut json = serde_json::Deserializer::from_slice(bytes);
        json.disable_recursion_limit();
        let output = Self::deserialize(serde_stacker::Deserializer::new(&mut json)).map_err(mismatch)?;
        json.end().map_err(mismatch)?;
        Ok(output)
    }

    pub fn parse_str(text: &str) -> Result<Self> {
        Self::parse(text.as_bytes())
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(OutputError::is_error)
    }

    pub fn diagnostics(&self, severity: Severity) -> impl Iterator<Item = &OutputError> {
        self.errors.iter().filter(move |e| e.severity == severity)
    }

    /// Sources in compiler file-index order.
    pub fn sources_by_id(&self) -> Vec<(&str, &OutputSource)> {
        let mut sources: Vec<_> = self
            .sources
            .iter()
            .map(|(name, source)| (name.as_str(), source))
            .collect();
        sources.sort_by_key(|(_, source)| source.id);
        sources
    }

    pub fn contract(&self, file: &str, name: &str) -> Option<&OutputContract> {
        self.contracts.get(file).and_then(|c| c.get(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// One diagnostic from `errors[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputError {
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: String,
    pub component: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_source_locations: Vec<SecondarySourceLocation>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl OutputError {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.formatted_message {
            Some(formatted) => f.write_str(formatted.trim_end()),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub start: i64,
    pub end: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondarySourceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSource {
    pub id: u32,
    /// Raw AST; turned into typed nodes by the IR builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Per-contract artifacts. Each one is present only if it was selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputContract {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userdoc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devdoc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir_optimized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_layout: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ewasm: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl OutputContract {
    /// Hex of `evm.bytecode.object`, if it was requested.
    pub fn bytecode_object(&self) -> Option<&str> {
        self.evm.as_ref()?.pointer("/bytecode/object")?.as_str()
    }
}

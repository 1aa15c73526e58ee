use crate::{CompilerError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tiny_keccak::{Hasher, Keccak};

/// Fields a model does not know about, kept verbatim for re-serialization.
pub type Extra = IndexMap<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Solidity,
    Yul,
}

/// A complete `solc --standard-json` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolcInput {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub sources: IndexMap<String, SourceDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SolcInput {
    pub fn new(sources: IndexMap<String, SourceDescriptor>) -> Self {
        Self {
            sources,
            ..Self::default()
        }
    }

    /// Builds a request from logical options. The result is validated.
    pub fn from_options(
        sources: IndexMap<String, SourceDescriptor>,
        options: &CompileOptions,
    ) -> Result<Self> {
        let optimizer = if options.optimizer_enabled.is_some() || options.optimizer_runs.is_some() {
            Some(OptimizerSettings {
                enabled: options.optimizer_enabled,
                runs: options.optimizer_runs,
                ..OptimizerSettings::default()
            })
        } else {
            None
        };

        let debug = if options.revert_strings.is_some() || !options.debug_info.is_empty() {
            Some(DebugSettings {
                revert_strings: options.revert_strings,
                debug_info: (!options.debug_info.is_empty()).then(|| options.debug_info.clone()),
                ..DebugSettings::default()
            })
        } else {
            None
        };

        let model_checker = ModelCheckerSettings {
            engine: options.model_checker_engine,
            targets: options.model_checker_targets.clone(),
            solvers: options.model_checker_solvers.clone(),
            invariants: options.model_checker_invariants.clone(),
            timeout: options.model_checker_timeout,
            ..ModelCheckerSettings::default()
        };
        // An engine-less object is still sent; solc applies its own default engine.
        let model_checker = (model_checker != ModelCheckerSettings::default()).then_some(model_checker);

        let mut selection = OutputSelection::default();
        selection.select("*", ContractSelector::File, [OutputKind::Ast]);
        if !options.outputs.is_empty() && !options.stop_after_parsing {
            selection.select("*", ContractSelector::All, options.outputs.iter().cloned());
        }

        let settings = Settings {
            stop_after: options.stop_after_parsing.then_some(StopAfter::Parsing),
            remappings: (!options.remappings.is_empty()).then(|| options.remappings.clone()),
            optimizer,
            evm_version: options.evm_version,
            via_ir: options.via_ir,
            debug,
            libraries: (!options.libraries.is_empty()).then(|| options.libraries.clone()),
            output_selection: Some(selection),
            model_checker,
            ..Settings::default()
        };

        let input = SolcInput {
            language: Language::Solidity,
            sources,
            settings: Some(settings),
            extra: Extra::new(),
        };
        input.validate()?;
        Ok(input)
    }

    /// Rejects requests solc would refuse or misread.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(CompilerError::Validation("no sources given".to_string()));
        }
        for (name, source) in &self.sources {
            source
                .check()
                .map_err(|e| CompilerError::Validation(format!("source '{}': {}", name, e)))?;
        }

        let Some(settings) = &self.settings else {
            return Ok(());
        };

        for remapping in settings.remappings.iter().flatten() {
            if !remapping.contains('=') {
                return Err(CompilerError::Validation(format!(
                    "remapping '{}' must have the form [context:]prefix=target",
                    remapping
                )));
            }
        }

        for (file, libraries) in settings.libraries.iter().flatten() {
            for (library, address) in libraries {
                if !is_address(address) {
                    return Err(CompilerError::Validation(format!(
                        "library {}:{} has invalid address '{}'",
                        file, library, address
                    )));
                }
            }
        }

        if settings.stop_after.is_some() {
            let selects_artifacts = settings
                .output_selection
                .iter()
                .flat_map(|s| s.kinds())
                .any(|kind| *kind != OutputKind::Ast);
            if selects_artifacts {
                return Err(CompilerError::Validation(
                    "stopAfter only allows the ast output".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn is_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// One entry of `sources`: inline content or remote URLs, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSourceDescriptor", into = "RawSourceDescriptor")]
pub struct SourceDescriptor {
    body: SourceBody,
    keccak256: Option<String>,
    extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceBody {
    Content(String),
    Urls(Vec<String>),
}

impl SourceDescriptor {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            body: SourceBody::Content(content.into()),
            keccak256: None,
            extra: Extra::new(),
        }
    }

    pub fn urls(urls: Vec<String>) -> Result<Self> {
        if urls.is_empty() {
            return Err(CompilerError::Validation(
                "a source needs at least one url".to_string(),
            ));
        }
        Ok(Self {
            body: SourceBody::Urls(urls),
            keccak256: None,
            extra: Extra::new(),
        })
    }

    /// Attaches the keccak-256 of the inline content. URL sources are left as is.
    pub fn with_content_hash(mut self) -> Self {
        if let SourceBody::Content(content) = &self.body {
            self.keccak256 = Some(keccak256_hex(content.as_bytes()));
        }
        self
    }

    pub fn body(&self) -> &SourceBody {
        &self.body
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            SourceBody::Content(content) => Some(content),
            SourceBody::Urls(_) => None,
        }
    }

    pub fn keccak256(&self) -> Option<&str> {
        self.keccak256.as_deref()
    }

    fn check(&self) -> std::result::Result<(), String> {
        match (&self.body, &self.keccak256) {
            (SourceBody::Urls(urls), _) if urls.is_empty() => {
                Err("exactly one of `content`, `urls` must be set".to_string())
            }
            (SourceBody::Content(content), Some(hash)) => {
                let actual = keccak256_hex(content.as_bytes());
                if hash.eq_ignore_ascii_case(&actual) {
                    Ok(())
                } else {
                    Err(format!("keccak256 {} does not match content ({})", hash, actual))
                }
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn keccak256_hex(data: &[u8]) -> String {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut digest = [0u8; 32];
    hasher.finalize(&mut digest);
    format!("0x{}", hex::encode(digest))
}

#[derive(Serialize, Deserialize)]
struct RawSourceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keccak256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    urls: Option<Vec<String>>,
    #[serde(flatten)]
    extra: Extra,
}

impl TryFrom<RawSourceDescriptor> for SourceDescriptor {
    type Error = CompilerError;

    fn try_from(raw: RawSourceDescriptor) -> Result<Self> {
        let body = match (raw.content, raw.urls) {
            (Some(content), None) => SourceBody::Content(content),
            (None, Some(urls)) if !urls.is_empty() => SourceBody::Urls(urls),
            _ => {
                return Err(CompilerError::Validation(
                    "exactly one of `content`, `urls` must be set".to_string(),
                ))
            }
        };
        Ok(Self {
            body,
            keccak256: raw.keccak256,
            extra: raw.extra,
        })
    }
}

impl From<SourceDescriptor> for RawSourceDescriptor {
    fn from(source: SourceDescriptor) -> Self {
        let (content, urls) = match source.body {
            SourceBody::Content(content) => (Some(content), None),
            SourceBody::Urls(urls) => (None, Some(urls)),
        };
        Self {
            keccak256: source.keccak256,
            content,
            urls,
            extra: source.extra,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_after: Option<StopAfter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remappings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<EvmVersion>,
    #[serde(default, rename = "viaIR", skip_serializing_if = "Option::is_none")]
    pub via_ir: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataSettings>,
    /// Source unit name, then library name, then address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libraries: Option<IndexMap<String, IndexMap<String, String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_selection: Option<OutputSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_checker: Option<ModelCheckerSettings>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopAfter {
    Parsing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<OptimizerDetails>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peephole: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inliner: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jumpdest_remover: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_literals: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deduplicate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cse: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant_optimizer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_counter_for_loop_unchecked_increment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yul: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yul_details: Option<YulDetails>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YulDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_allocation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer_steps: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_strings: Option<RevertStrings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<Vec<DebugInfo>>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevertStrings {
    Default,
    Strip,
    Debug,
    VerboseDebug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DebugInfo {
    Location,
    Snippet,
    #[serde(rename = "*")]
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSettings {
    #[serde(default, rename = "appendCBOR", skip_serializing_if = "Option::is_none")]
    pub append_cbor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_literal_content: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode_hash: Option<BytecodeHash>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BytecodeHash {
    None,
    Ipfs,
    Bzzr1,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCheckerSettings {
    /// Source unit name to the contracts to verify.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub contracts: IndexMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub div_mod_no_slacks: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<ModelCheckerEngine>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invariants: Vec<ModelCheckerInvariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_unproved: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solvers: Vec<ModelCheckerSolver>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<ModelCheckerTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCheckerEngine {
    All,
    Bmc,
    Chc,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCheckerInvariant {
    Contract,
    Reentrancy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCheckerSolver {
    Cvc4,
    Smtlib2,
    Z3,
    Eld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelCheckerTarget {
    ConstantCondition,
    Underflow,
    Overflow,
    DivByZero,
    Balance,
    Assert,
    PopEmptyArray,
    OutOfBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvmVersion {
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
    Cancun,
    Prague,
    Osaka,
}

impl EvmVersion {
    pub const ALL: [EvmVersion; 14] = [
        EvmVersion::Homestead,
        EvmVersion::TangerineWhistle,
        EvmVersion::SpuriousDragon,
        EvmVersion::Byzantium,
        EvmVersion::Constantinople,
        EvmVersion::Petersburg,
        EvmVersion::Istanbul,
        EvmVersion::Berlin,
        EvmVersion::London,
        EvmVersion::Paris,
        EvmVersion::Shanghai,
        EvmVersion::Cancun,
        EvmVersion::Prague,
        EvmVersion::Osaka,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvmVersion::Homestead => "homestead",
            EvmVersion::TangerineWhistle => "tangerineWhistle",
            EvmVersion::SpuriousDragon => "spuriousDragon",
            EvmVersion::Byzantium => "byzantium",
            EvmVersion::Constantinople => "constantinople",
            EvmVersion::Petersburg => "petersburg",
            EvmVersion::Istanbul => "istanbul",
            EvmVersion::Berlin => "berlin",
            EvmVersion::London => "london",
            EvmVersion::Paris => "paris",
            EvmVersion::Shanghai => "shanghai",
            EvmVersion::Cancun => "cancun",
            EvmVersion::Prague => "prague",
            EvmVersion::Osaka => "osaka",
        }
    }
}

impl fmt::Display for EvmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvmVersion {
    type Err = CompilerError;

    fn from_str(s: &str) -> Result<Self> {
        EvmVersion::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CompilerError::Validation(format!("unknown EVM version '{}'", s)))
    }
}

/// Second level of `outputSelection`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContractSelector {
    /// `""`: file-level outputs such as the AST.
    File,
    /// `"*"`: every contract in the file.
    All,
    Named(String),
}

impl From<String> for ContractSelector {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" => ContractSelector::File,
            "*" => ContractSelector::All,
            _ => ContractSelector::Named(value),
        }
    }
}

impl From<ContractSelector> for String {
    fn from(selector: ContractSelector) -> Self {
        match selector {
            ContractSelector::File => String::new(),
            ContractSelector::All => "*".to_string(),
            ContractSelector::Named(name) => name,
        }
    }
}

/// An artifact name inside `outputSelection`. Names this model does not know
/// are kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputKind {
    Ast,
    Abi,
    Devdoc,
    Userdoc,
    Metadata,
    Ir,
    IrAst,
    IrOptimized,
    IrOptimizedAst,
    StorageLayout,
    Evm,
    EvmAssembly,
    EvmLegacyAssembly,
    EvmBytecode,
    EvmBytecodeFunctionDebugData,
    EvmBytecodeObject,
    EvmBytecodeOpcodes,
    EvmBytecodeSourceMap,
    EvmBytecodeLinkReferences,
    EvmBytecodeGeneratedSources,
    EvmDeployedBytecode,
    EvmDeployedBytecodeFunctionDebugData,
    EvmDeployedBytecodeObject,
    EvmDeployedBytecodeOpcodes,
    EvmDeployedBytecodeSourceMap,
    EvmDeployedBytecodeLinkReferences,
    EvmDeployedBytecodeGeneratedSources,
    EvmDeployedBytecodeImmutableReferences,
    EvmMethodIdentifiers,
    EvmGasEstimates,
    Ewasm,
    EwasmWast,
    EwasmWasm,
    All,
    Other(String),
}

impl OutputKind {
    const KNOWN: [OutputKind; 34] = [
        OutputKind::Ast,
        OutputKind::Abi,
        OutputKind::Devdoc,
        OutputKind::Userdoc,
        OutputKind::Metadata,
        OutputKind::Ir,
        OutputKind::IrAst,
        OutputKind::IrOptimized,
        OutputKind::IrOptimizedAst,
        OutputKind::StorageLayout,
        OutputKind::Evm,
        OutputKind::EvmAssembly,
        OutputKind::EvmLegacyAssembly,
        OutputKind::EvmBytecode,
        OutputKind::EvmBytecodeFunctionDebugData,
        OutputKind::EvmBytecodeObject,
        OutputKind::EvmBytecodeOpcodes,
        OutputKind::EvmBytecodeSourceMap,
        OutputKind::EvmBytecodeLinkReferences,
        OutputKind::EvmBytecodeGeneratedSources,
        OutputKind::EvmDeployedBytecode,
        OutputKind::EvmDeployedBytecodeFunctionDebugData,
        OutputKind::EvmDeployedBytecodeObject,
        OutputKind::EvmDeployedBytecodeOpcodes,
        OutputKind::EvmDeployedBytecodeSourceMap,
        OutputKind::EvmDeployedBytecodeLinkReferences,
        OutputKind::EvmDeployedBytecodeGeneratedSources,
        OutputKind::EvmDeployedBytecodeImmutableReferences,
        OutputKind::EvmMethodIdentifiers,
        OutputKind::EvmGasEstimates,
        OutputKind::Ewasm,
        OutputKind::EwasmWast,
        OutputKind::EwasmWasm,
        OutputKind::All,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            OutputKind::Ast => "ast",
            OutputKind::Abi => "abi",
            OutputKind::Devdoc => "devdoc",
            OutputKind::Userdoc => "userdoc",
            OutputKind::Metadata => "metadata",
            OutputKind::Ir => "ir",
            OutputKind::IrAst => "irAst",
            OutputKind::IrOptimized => "irOptimized",
            OutputKind::IrOptimizedAst => "irOptimizedAst",
            OutputKind::StorageLayout => "storageLayout",
            OutputKind::Evm => "evm",
            OutputKind::EvmAssembly => "evm.assembly",
            OutputKind::EvmLegacyAssembly => "evm.legacyAssembly",
            OutputKind::EvmBytecode => "evm.bytecode",
            OutputKind::EvmBytecodeFunctionDebugData => "evm.bytecode.functionDebugData",
            OutputKind::EvmBytecodeObject => "evm.bytecode.object",
            OutputKind::EvmBytecodeOpcodes => "evm.bytecode.opcodes",
            OutputKind::EvmBytecodeSourceMap => "evm.bytecode.sourceMap",
            OutputKind::EvmBytecodeLinkReferences => "evm.bytecode.linkReferences",
            OutputKind::EvmBytecodeGeneratedSources => "evm.bytecode.generatedSources",
            OutputKind::EvmDeployedBytecode => "evm.deployedBytecode",
            OutputKind::EvmDeployedBytecodeFunctionDebugData => {
                "evm.deployedBytecode.functionDebugData"
            }
            OutputKind::EvmDeployedBytecodeObject => "evm.deployedBytecode.object",
            OutputKind::EvmDeployedBytecodeOpcodes => "evm.deployedBytecode.opcodes",
            OutputKind::EvmDeployedBytecodeSourceMap => "evm.deployedBytecode.sourceMap",
            OutputKind::EvmDeployedBytecodeLinkReferences => "evm.deployedBytecode.linkReferences",
            OutputKind::EvmDeployedBytecodeGeneratedSources => {
                "evm.deployedBytecode.generatedSources"
            }
            OutputKind::EvmDeployedBytecodeImmutableReferences => {
                "evm.deployedBytecode.immutableReferences"
            }
            OutputKind::EvmMethodIdentifiers => "evm.methodIdentifiers",
            OutputKind::EvmGasEstimates => "evm.gasEstimates",
            OutputKind::Ewasm => "ewasm",
            OutputKind::EwasmWast => "ewasm.wast",
            OutputKind::EwasmWasm => "ewasm.wasm",
            OutputKind::All => "*",
            OutputKind::Other(name) => name,
        }
    }
}

impl From<String> for OutputKind {
    fn from(value: String) -> Self {
        OutputKind::KNOWN
            .iter()
            .find(|kind| kind.as_str() == value)
            .cloned()
            .unwrap_or(OutputKind::Other(value))
    }
}

impl From<OutputKind> for String {
    fn from(kind: OutputKind) -> Self {
        kind.as_str().to_string()
    }
}

impl FromStr for OutputKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(OutputKind::from(s.to_string()))
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `outputSelection`: source unit name (or `*`), then contract selector, then
/// the artifacts to produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputSelection(pub IndexMap<String, IndexMap<ContractSelector, Vec<OutputKind>>>);

impl OutputSelection {
    /// Adds `kinds` for `selector` in `unit`, keeping existing entries.
    pub fn select(
        &mut self,
        unit: &str,
        selector: ContractSelector,
        kinds: impl IntoIterator<Item = OutputKind>,
    ) -> &mut Self {
        let entry = self
            .0
            .entry(unit.to_string())
            .or_default()
            .entry(selector)
            .or_default();
        for kind in kinds {
            if !entry.contains(&kind) {
                entry.push(kind);
            }
        }
        self
    }

    pub fn get(&self, unit: &str, selector: &ContractSelector) -> Option<&[OutputKind]> {
        self.0
            .get(unit)
            .and_then(|contracts| contracts.get(selector))
            .map(Vec::as_slice)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &OutputKind> {
        self.0.values().flat_map(|c| c.values()).flatten()
    }
}

/// Compile settings as a caller thinks of them, before wire encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub optimizer_enabled: Option<bool>,
    pub optimizer_runs: Option<u32>,
    pub evm_version: Option<EvmVersion>,
    pub via_ir: Option<bool>,
    pub remappings: Vec<String>,
    pub libraries: IndexMap<String, IndexMap<String, String>>,
    /// Contract-level artifacts; the AST is always requested.
    pub outputs: Vec<OutputKind>,
    pub model_checker_engine: Option<ModelCheckerEngine>,
    pub model_checker_targets: Vec<ModelCheckerTarget>,
    pub model_checker_solvers: Vec<ModelCheckerSolver>,
    pub model_checker_invariants: Vec<ModelCheckerInvariant>,
    pub model_checker_timeout: Option<u64>,
    pub debug_info: Vec<DebugInfo>,
    pub revert_strings: Option<RevertStrings>,
    pub stop_after_parsing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_source_needs_exactly_one_body() {
        let both: std::result::Result<SourceDescriptor, _> =
            serde_json::from_value(json!({"content": "x", "urls": ["a.sol"]}));
        assert!(both.is_err());

        let neither: std::result::Result<SourceDescriptor, _> =
            serde_json::from_value(json!({"keccak256": "0x00"}));
        assert!(neither.is_err());

        let urls: SourceDescriptor =
            serde_json::from_value(json!({"urls": ["/tmp/a.sol"]})).unwrap();
        assert_eq!(urls.text(), None);

        assert!(SourceDescriptor::urls(Vec::new()).is_err());
    }

    #[test]
    fn test_content_hash() {
        let source = SourceDescriptor::content("").with_content_hash();
        assert_eq!(
            source.keccak256(),
            Some("0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
        assert!(source.check().is_ok());

        let tampered: SourceDescriptor = serde_json::from_value(json!({
            "content": "contract A {}",
            "keccak256": "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        }))
        .unwrap();
        assert!(SolcInput::new(IndexMap::from([("a.sol".to_string(), tampered)]))
            .validate()
            .is_err());
    }

    #[test]
    fn test_output_kind_names() {
        assert_eq!(
            OutputKind::from("evm.deployedBytecode.immutableReferences".to_string()),
            OutputKind::EvmDeployedBytecodeImmutableReferences
        );
        assert_eq!(OutputKind::from("*".to_string()), OutputKind::All);
        assert_eq!(
            OutputKind::from("transientStorageLayout".to_string()),
            OutputKind::Other("transientStorageLayout".to_string())
        );
        assert_eq!(OutputKind::IrOptimizedAst.to_string(), "irOptimizedAst");
    }

    #[test]
    fn test_evm_version_parsing() {
        assert_eq!("paris".parse::<EvmVersion>().unwrap(), EvmVersion::Paris);
        assert_eq!(
            "tangerinewhistle".parse::<EvmVersion>().unwrap(),
            EvmVersion::TangerineWhistle
        );
        assert!("frontier".parse::<EvmVersion>().is_err());
        assert!(EvmVersion::London < EvmVersion::Cancun);
    }

    #[test]
    fn test_library_addresses_are_checked() {
        let options = CompileOptions {
            libraries: IndexMap::from([(
                "lib.sol".to_string(),
                IndexMap::from([("Math".to_string(), "0x1234".to_string())]),
            )]),
            ..CompileOptions::default()
        };
        let sources = IndexMap::from([("a.sol".to_string(), SourceDescriptor::content("x"))]);
        assert!(matches!(
            SolcInput::from_options(sources, &options),
            Err(CompilerError::Validation(_))
        ));
    }

    #[test]
    fn test_model_checker_options_without_engine() {
        let sources = IndexMap::from([("a.sol".to_string(), SourceDescriptor::content("x"))]);
        let options = CompileOptions {
            model_checker_targets: vec![ModelCheckerTarget::Overflow],
            model_checker_solvers: vec![ModelCheckerSolver::Z3],
            model_checker_invariants: vec![ModelCheckerInvariant::Reentrancy],
            model_checker_timeout: Some(500),
            ..CompileOptions::default()
        };

        let input = SolcInput::from_options(sources.clone(), &options).unwrap();
        let encoded = serde_json::to_value(&input).unwrap();
        assert_eq!(
            encoded["settings"]["modelChecker"],
            json!({
                "invariants": ["reentrancy"],
                "solvers": ["z3"],
                "targets": ["overflow"],
                "timeout": 500
            })
        );

        let plain = SolcInput::from_options(sources, &CompileOptions::default()).unwrap();
        let encoded = serde_json::to_value(&plain).unwrap();
        assert!(encoded["settings"].get("modelChecker").is_none());
    }
}

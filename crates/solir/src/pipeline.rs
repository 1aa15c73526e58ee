use indexmap::IndexMap;
use solir_compiler::{
    CompileOptions, CompilerError, DriverConfig, OutputError, SolcDriver, SolcInput, SolcOutput,
    SourceDescriptor,
};
use solir_core::{GraphBuilder, IrError, IrGraph};
use solir_svm::{SolcVersion, SolcVersionManager, SvmError, ToSolcVersion};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Svm(#[from] SvmError),
    #[error(transparent)]
    Compiler(#[from] CompilerError),
    #[error(transparent)]
    Ir(#[from] IrError),
    #[error("Compilation failed with {} error(s)", .0.len())]
    Diagnostics(Vec<OutputError>),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// What one compile request produced.
#[derive(Debug)]
pub struct Compilation {
    pub version: SolcVersion,
    pub input: SolcInput,
    pub output: SolcOutput,
    pub graph: IrGraph,
}

/// Resolve, install if missing, build the request, drive solc, build the IR.
pub struct Pipeline {
    svm: SolcVersionManager,
    driver: DriverConfig,
    options: CompileOptions,
}

impl Pipeline {
    pub fn new(svm: SolcVersionManager, driver: DriverConfig, options: CompileOptions) -> Self {
        Self {
            svm,
            driver,
            options,
        }
    }

    pub fn svm(&self) -> &SolcVersionManager {
        &self.svm
    }

    pub async fn compile<V: ToSolcVersion + ?Sized>(
        &self,
        version: &V,
        sources: IndexMap<String, SourceDescriptor>,
    ) -> Result<Compilation> {
        let input = SolcInput::from_options(sources, &self.options)?;
        let version = self.svm.install(version, None).await?;
        let solc = self.svm.get_path(&version)?;

        info!(%version, sources = input.sources.len(), "Compiling");
        let output = SolcDriver::new(solc, self.driver.clone())
            .compile(&input)
            .await?;
        if output.has_errors() {
            let errors = output.errors.iter().filter(|e| e.is_error()).cloned().collect();
            return Err(PipelineError::Diagnostics(errors));
        }

        let graph = build_graph(&output, |name| {
            input
                .sources
                .get(name)
                .and_then(|s| s.text())
                .map(str::to_string)
        })?;
        Ok(Compilation {
            version,
            input,
            output,
            graph,
        })
    }
}

/// Builds one graph from every source AST in `output`, in file-index order.
/// `text` supplies source text for line/column mapping where it is known.
pub fn build_graph(
    output: &SolcOutput,
    text: impl Fn(&str) -> Option<String>,
) -> std::result::Result<IrGraph, IrError> {
    let mut builder = GraphBuilder::new();
    for (name, source) in output.sources_by_id() {
        let ast = source.ast.as_ref().ok_or_else(|| IrError::ProtocolMismatch {
            unit: name.to_string(),
            message: "response carries no AST for this source".to_string(),
        })?;
        let text = text(name);
        builder.add_source_unit(name, Some(source.id), ast, text.as_deref())?;
    }
    let graph = builder.finish();
    debug!(nodes = graph.len(), "Built IR graph");
    Ok(graph)
}

/// Reads `.sol` files, walking directories, keyed by their path as given.
pub fn collect_sources(paths: &[PathBuf]) -> Result<IndexMap<String, SourceDescriptor>> {
    let mut sources = IndexMap::new();
    for path in paths {
        let walker = WalkDir::new(path).sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| PipelineError::Io {
                path: path.clone(),
                source: e.into(),
            })?;
            let file = entry.path();
            if !entry.file_type().is_file() || !is_solidity(file) {
                continue;
            }
            let content = std::fs::read_to_string(file).map_err(|source| PipelineError::Io {
                path: file.to_path_buf(),
                source,
            })?;
            sources.insert(unit_name(file), SourceDescriptor::content(content));
        }
    }
    Ok(sources)
}

fn is_solidity(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "sol")
}

fn unit_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_collect_sources_walks_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("b.sol"), "contract B {}").unwrap();
        std::fs::write(dir.path().join("lib/a.sol"), "contract A {}").unwrap();
        std::fs::write(dir.path().join("README.md"), "# docs").unwrap();

        let sources = collect_sources(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = sources
            .keys()
            .map(|k| k.rsplit('/').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["b.sol", "a.sol"]);
        assert_eq!(sources[0].text(), Some("contract B {}"));
    }

    #[test]
    fn test_missing_ast_is_protocol_mismatch() {
        let output = SolcOutput::parse_str(r#"{"sources": {"a.sol": {"id": 0}}}"#).unwrap();
        assert!(matches!(
            build_graph(&output, |_| None),
            Err(IrError::ProtocolMismatch { .. })
        ));
    }
}

use crate::input::SolcInput;
use crate::output::SolcOutput;
use crate::{CompilerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Filesystem access granted to the compiler on top of its inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub allow_paths: Vec<PathBuf>,
    pub base_path: Option<PathBuf>,
    pub include_paths: Vec<PathBuf>,
}

/// Runs one solc binary in standard-JSON mode.
#[derive(Debug, Clone)]
pub struct SolcDriver {
    solc: PathBuf,
    config: DriverConfig,
}

impl SolcDriver {
    pub fn new(solc: impl Into<PathBuf>, config: DriverConfig) -> Self {
        Self {
            solc: solc.into(),
            config,
        }
    }

    pub fn solc(&self) -> &Path {
        &self.solc
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["--standard-json".to_string()];
        if !self.config.allow_paths.is_empty() {
            let joined: Vec<_> = self
                .config
                .allow_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            args.push("--allow-paths".to_string());
            args.push(joined.join(","));
        }
        if let Some(base) = &self.config.base_path {
            args.push("--base-path".to_string());
            args.push(base.display().to_string());
        }
        for include in &self.config.include_paths {
            args.push("--include-path".to_string());
            args.push(include.display().to_string());
        }
        args
    }

    /// Validates `input`, runs the compiler and parses its response.
    ///
    /// Compile errors come back inside the returned output; only a failed
    /// process or an unreadable response is an `Err`.
    pub async fn compile(&self, input: &SolcInput) -> Result<SolcOutput> {
        input.validate()?;
        let request = serde_json::to_vec(input)
            .map_err(|e| CompilerError::Validation(format!("cannot encode request: {}", e)))?;
        let stdout = self.run(request).await?;
        let output = SolcOutput::parse(&stdout)?;
        info!(
            sources = output.sources.len(),
            diagnostics = output.errors.len(),
            "Compilation finished"
        );
        Ok(output)
    }

    /// Feeds `request` to the compiler and returns its raw stdout.
    pub async fn run(&self, request: Vec<u8>) -> Result<Vec<u8>> {
        let io_error = |source| CompilerError::Io {
            path: self.solc.clone(),
            source,
        };

        debug!(solc = %self.solc.display(), args = ?self.args(), "Spawning compiler");
        let mut child = Command::new(&self.solc)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(io_error)?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            io_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "compiler stdin unavailable",
            ))
        })?;
        // stdin is fed while stdout drains
        let writer = tokio::spawn(async move {
            stdin.write_all(&request).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await.map_err(io_error)?;
        let written = writer.await.map_err(|e| {
            io_error(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
        })?;

        debug!(status = %output.status, stdout = output.stdout.len(), "Compiler exited");
        if !output.status.success() {
            return Err(CompilerError::Invocation {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // solc may exit before reading all of stdin
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(io_error(e));
            }
        }
        Ok(output.stdout)
    }
}

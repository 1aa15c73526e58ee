use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use futures_util::future::join_all;
use solir::compiler::EvmVersion;
use solir::{
    build_graph, collect_sources, CompileOptions, DriverConfig, IrGraph, Pipeline, PipelineError,
    SolcOutput, SolcVersionManager, SvmConfig,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "solir")]
#[command(about = "solir - solc management and typed IR for smart contract analysis")]
#[command(version = "0.1.0")]
#[command(author = "Gianluca Brigandi <gbrigand@gmail.com>")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage installed solc versions
    Svm {
        #[command(subcommand)]
        command: SvmCommands,
    },

    /// Print the IR tree of a saved standard-JSON response
    Ir {
        output: PathBuf,

        /// Directory source unit names are resolved against
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Compile Solidity files and summarize the resulting IR
    Compile {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(long)]
        solc: String,

        #[arg(long)]
        optimize: bool,

        #[arg(long, requires = "optimize")]
        runs: Option<u32>,

        #[arg(long)]
        evm_version: Option<EvmVersion>,

        #[arg(long)]
        via_ir: bool,

        #[arg(long = "remap")]
        remappings: Vec<String>,

        #[arg(long)]
        base_path: Option<PathBuf>,

        #[arg(long = "include-path")]
        include_paths: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SvmCommands {
    List {
        /// Show releasable versions instead of installed ones
        #[arg(long)]
        available: bool,

        /// Refetch the release catalog
        #[arg(long, requires = "available")]
        force: bool,
    },
    Install {
        #[arg(required = true)]
        versions: Vec<String>,
    },
    Remove {
        version: String,
    },
    Path {
        version: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Svm { command } => cmd_svm(command).await,
        Commands::Ir { output, root } => cmd_ir(output, root),
        Commands::Compile {
            paths,
            solc,
            optimize,
            runs,
            evm_version,
            via_ir,
            remappings,
            base_path,
            include_paths,
        } => {
            let options = CompileOptions {
                optimizer_enabled: optimize.then_some(true),
                optimizer_runs: runs,
                evm_version,
                via_ir: via_ir.then_some(true),
                remappings,
                ..CompileOptions::default()
            };
            let driver = DriverConfig {
                allow_paths: Vec::new(),
                base_path,
                include_paths,
            };
            cmd_compile(paths, solc, options, driver).await
        }
    }
}

async fn cmd_svm(command: SvmCommands) -> Result<()> {
    let svm = SolcVersionManager::new(SvmConfig::from_env());

    match command {
        SvmCommands::List { available, force } => {
            let installed = svm.list_installed()?;
            if available {
                for version in svm.list_available(force).await? {
                    if installed.contains(&version) {
                        println!("{} {}", version, "(installed)".bright_green());
                    } else {
                        println!("{}", version);
                    }
                }
            } else if installed.is_empty() {
                println!("{}", "No compilers installed".yellow());
            } else {
                for version in installed {
                    println!("{}", version);
                }
            }
        }
        SvmCommands::Install { versions } => {
            let results = join_all(versions.iter().map(|v| svm.install(v.as_str(), None))).await;
            let mut failed = 0;
            for (requested, result) in versions.iter().zip(results) {
                match result {
                    Ok(version) => println!(
                        " {} solc {}",
                        "INSTALLED:".bright_green().bold(),
                        version
                    ),
                    Err(e) => {
                        failed += 1;
                        eprintln!(" {} {}: {}", "FAILED:".bright_red().bold(), requested, e);
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{} of {} installs failed", failed, versions.len());
            }
        }
        SvmCommands::Remove { version } => {
            svm.remove(version.as_str())?;
            println!(" {} solc {}", "REMOVED:".bright_green().bold(), version);
        }
        SvmCommands::Path { version } => {
            println!("{}", svm.get_path(version.as_str())?.display());
        }
    }
    Ok(())
}

fn cmd_ir(output_path: PathBuf, root: Option<PathBuf>) -> Result<()> {
    let bytes = std::fs::read(&output_path)
        .with_context(|| format!("Failed to read {}", output_path.display()))?;
    let output = SolcOutput::parse(&bytes)?;
    let root = root.unwrap_or_else(|| {
        output_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    });

    let graph = build_graph(&output, |name| std::fs::read_to_string(root.join(name)).ok())?;
    print_tree(&graph);
    Ok(())
}

async fn cmd_compile(
    paths: Vec<PathBuf>,
    solc: String,
    options: CompileOptions,
    driver: DriverConfig,
) -> Result<()> {
    let sources = collect_sources(&paths)?;
    if sources.is_empty() {
        println!("{}", "  No Solidity sources found".yellow());
        return Ok(());
    }
    debug!(sources = sources.len(), "Collected Solidity sources");

    let pipeline = Pipeline::new(
        SolcVersionManager::new(SvmConfig::from_env()),
        driver,
        options,
    );
    let compilation = match pipeline.compile(solc.as_str(), sources).await {
        Ok(compilation) => compilation,
        Err(PipelineError::Diagnostics(errors)) => {
            for error in &errors {
                eprintln!("{}", error.to_string().bright_red());
            }
            anyhow::bail!("Compilation failed with {} error(s)", errors.len());
        }
        Err(e) => return Err(e.into()),
    };

    for warning in compilation.output.errors.iter().filter(|e| !e.is_error()) {
        eprintln!("{}", warning.to_string().yellow());
    }
    println!(
        " {} {} source unit(s) with solc {}, {} IR nodes",
        "COMPILED:".bright_green().bold(),
        compilation.output.sources.len(),
        compilation.version,
        compilation.graph.len()
    );
    for node in compilation.graph.traverse() {
        if let solir::NodeKind::FunctionDefinition(function) = node.kind() {
            let effects = node.state_effects();
            let contract = node
                .enclosing_contract()
                .and_then(|c| c.kind().declared_name().map(str::to_string))
                .unwrap_or_default();
            println!("   {}.{}: {}", contract, function.name, effects);
        }
    }
    Ok(())
}

fn print_tree(graph: &IrGraph) {
    for unit in graph.source_units() {
        println!("{}", unit.name.bright_cyan().bold());
        let Ok(root) = graph.root(&unit.name) else {
            continue;
        };
        for node in root.traverse() {
            let depth = node.ancestors().count();
            let mut line = format!("{}{}", "  ".repeat(depth + 1), node.kind().name());
            if let Some(name) = node.kind().declared_name().filter(|n| !n.is_empty()) {
                line.push(' ');
                line.push_str(name);
            }
            let span = match node.location() {
                Ok(location) => format!("{}-{}", location.start, location.end),
                Err(_) => format!("@{}", node.range()),
            };
            line.push_str(&format!(" {}", span.dimmed()));
            let effects = node.state_effects();
            if !effects.is_empty() {
                line.push_str(&format!(" {}", format!("[{}]", effects).yellow()));
            }
            println!("{}", line);
        }
    }
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Convert Power BI templates to and from a version control friendly tree
#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a template into a directory
    Extract {
        /// Template to extract
        file: PathBuf,

        /// Output directory, defaults to `<file>.extract`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compress a directory back into a template
    Compress {
        /// Directory written by `extract`
        dir: PathBuf,

        /// Output template, defaults to `<dir>.recompressed`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn extract(file: &Path, output: &Path) -> anyhow::Result<()> {
    let data = fs::read(file).with_context(|| format!("unable to read {}", file.display()))?;
    let tree = pbit_vcs::extract(&data)
        .with_context(|| format!("unable to extract {}", file.display()))?;

    if output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("unable to clear {}", output.display()))?;
    }

    if let Err(e) = pbit_vcs::write_tree(output, &tree) {
        let _ = fs::remove_dir_all(output);
        return Err(e).with_context(|| format!("unable to write {}", output.display()));
    }

    info!(entries = tree.manifest().len(), output = %output.display(), "extracted");
    Ok(())
}

fn compress(dir: &Path, output: &Path) -> anyhow::Result<()> {
    let tree = pbit_vcs::read_tree(dir)
        .with_context(|| format!("unable to read {}", dir.display()))?;
    let data = pbit_vcs::compress(&tree)
        .with_context(|| format!("unable to compress {}", dir.display()))?;
    fs::write(output, &data).with_context(|| format!("unable to write {}", output.display()))?;
    info!(entries = tree.manifest().len(), output = %output.display(), "compressed");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Extract { file, output } => {
            let output = output.unwrap_or_else(|| with_suffix(&file, ".extract"));
            extract(&file, &output)
        }
        Command::Compress { dir, output } => {
            let output = output.unwrap_or_else(|| with_suffix(&dir, ".recompressed"));
            compress(&dir, &output)
        }
    }
}

use anyhow::Context;
use clap::Parser;
use pbit_vcs::MashupContainer;
use std::{fs, io::Read, path::PathBuf};

/// Print the segment lengths of a DataMashup payload
#[derive(Parser)]
struct Cli {
    /// Raw DataMashup payload, or a template when `--container` is given
    file: PathBuf,

    /// Read the DataMashup entry out of a template
    #[arg(long)]
    container: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut data = fs::read(&cli.file)
        .with_context(|| format!("unable to read {}", cli.file.display()))?;

    if cli.container {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data))?;
        let mut entry = archive.by_name("DataMashup")?;
        let mut payload = Vec::new();
        entry.read_to_end(&mut payload)?;
        data = payload;
    }

    let container = MashupContainer::parse(&data)?;
    println!("package: {}", container.package().len());
    println!("first xml: {}", container.first_xml().len());
    println!("related: {}", container.related_len()?);
    println!("second xml: {}", container.second_xml().len());
    println!("tail: {}", container.tail().len());
    Ok(())
}

//! Man page generator for cxlmem
//!
//! Renders `cxlmem.1` plus one `cxlmem-<subcommand>.1` page per subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
#[allow(dead_code)]
mod cli;

fn render(cmd: clap::Command, title: &str, path: &Path) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).title(title).render(&mut buffer)?;
    fs::write(path, buffer)?;
    println!("  {}", path.display());
    Ok(())
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    println!("Writing man pages to {}:", output_dir.display());
    let cmd = cli::Cli::command();
    for sub in cmd.get_subcommands() {
        let name = format!("cxlmem-{}", sub.get_name());
        render(sub.clone(), &name, &output_dir.join(format!("{}.1", name)))?;
    }
    render(cmd, "cxlmem", &output_dir.join("cxlmem.1"))?;

    println!("\nView with: man -l {}", output_dir.join("cxlmem.1").display());
    Ok(())
}

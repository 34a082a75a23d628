//! Build script rendering the `softlayer-imager` manual pages.
//!
//! One page is written for the top-level command and one per subcommand
//! (`softlayer-imager-build.1`, ...) into `$OUT_DIR/man`.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

fn render(command: clap::Command, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let page = dir.join(format!("{}.1", command.get_name()));
    let mut buffer = Vec::new();
    Man::new(command).render(&mut buffer)?;
    fs::write(page, buffer)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir = env::var_os("OUT_DIR").map(PathBuf::from).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR was not set")
    })?;
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let root = Cli::command();
    let root_name = root.get_name().to_owned();
    for sub in root.get_subcommands() {
        let page_name = format!("{root_name}-{}", sub.get_name());
        render(sub.clone().name(page_name), &man_dir)?;
    }
    render(root, &man_dir)
}

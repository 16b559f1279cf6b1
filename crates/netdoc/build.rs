// Renders the netdoc man pages and shell completions into OUT_DIR.
//
//   $OUT_DIR/man/netdoc.1, netdoc-circuits.1, netdoc-circuits-list.1, ...
//   $OUT_DIR/completions/netdoc.bash, _netdoc, netdoc.fish, ...

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::Shell;

// cli.rs only pulls in clap and clap_complete, both build-dependencies.
#[path = "src/cli.rs"]
mod cli;

const BIN: &str = "netdoc";

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "OUT_DIR not set by Cargo")
    })?);

    let mut cmd = cli::Cli::command().name(BIN);
    cmd.build();

    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;
    render_manpages(&cmd, &man_dir)?;

    let completion_dir = out_dir.join("completions");
    fs::create_dir_all(&completion_dir)?;
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
        clap_complete::generate_to(shell, &mut cmd, BIN, &completion_dir)?;
    }

    Ok(())
}

/// One page per visible command path, `netdoc-<noun>-<verb>.1`.
fn render_manpages(root: &clap::Command, dir: &Path) -> io::Result<()> {
    let mut pending = vec![root.clone()];

    while let Some(cmd) = pending.pop() {
        let name = cmd.get_name().to_owned();
        let mut page = Vec::new();
        clap_mangen::Man::new(cmd.clone()).render(&mut page)?;
        fs::write(dir.join(format!("{name}.1")), page)?;

        pending.extend(
            cmd.get_subcommands()
                .filter(|sub| !sub.is_hide_set() && sub.get_name() != "help")
                .map(|sub| sub.clone().name(format!("{name}-{}", sub.get_name()))),
        );
    }
    Ok(())
}

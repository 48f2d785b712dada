mod app;
mod commands;
mod output;

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // smfkit logs go to stderr unless --json; RUST_LOG overrides the level
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else if cli.global.quiet {
            log::LevelFilter::Error
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("smfkit", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Info { path } => commands::info::run(path, &cli.global),
        Command::Build(args) => commands::build::run(args, &cli.global),
        Command::Extract {
            path,
            output,
            sections,
            lua,
        } => commands::extract::run(path, output.as_deref(), sections, *lua, &cli.global),
    }
}

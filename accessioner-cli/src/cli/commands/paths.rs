//! `paths`: show where the pipeline reads and writes

use anyhow::Result;
use colored::*;

use crate::config::Config;

pub fn handle_paths_command(config: &Config) -> Result<()> {
    match Config::default_path() {
        Some(path) => println!("{:<10} {}", "config".bold(), path.display()),
        None => println!("{:<10} {}", "config".bold(), "(no config directory)".dimmed()),
    }

    let layout = config.layout()?;
    let rows = [
        ("network", &layout.network),
        ("logs", &layout.logs),
        ("complete", &layout.complete),
        ("errors", &layout.errors),
        ("outputs", &layout.outputs),
        ("backups", &layout.backups),
    ];
    for (name, path) in rows {
        let status = if path.is_dir() {
            "ok".green()
        } else {
            "missing".yellow()
        };
        println!("{:<10} {} [{}]", name.bold(), path.display(), status);
    }
    Ok(())
}

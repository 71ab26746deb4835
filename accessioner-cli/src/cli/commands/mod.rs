//! Command handlers

pub mod check;
pub mod paths;
pub mod run;
pub mod schedule;

use anyhow::{Context, Result};
use dialoguer::Input;
use is_terminal::IsTerminal;

use crate::config::{Config, Credentials};

/// Credentials from config and environment, prompting for gaps when allowed
pub fn resolve_credentials(config: &Config, allow_prompt: bool) -> Result<Credentials> {
    if let Some(credentials) = config.credentials() {
        return Ok(credentials);
    }

    if !allow_prompt || !std::io::stdin().is_terminal() {
        anyhow::bail!(
            "ArchivesSpace credentials are incomplete. Set [api] url/username in the config and \
             ACCESSIONER_API_PASSWORD (or the matching ACCESSIONER_API_* variables)."
        );
    }

    let present = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

    let url = match present(&config.api.url) {
        Some(url) => url,
        None => Input::<String>::new()
            .with_prompt("ArchivesSpace API URL")
            .interact_text()
            .context("Failed to read API URL")?,
    };
    let username = match present(&config.api.username) {
        Some(username) => username,
        None => Input::<String>::new()
            .with_prompt("ArchivesSpace username")
            .interact_text()
            .context("Failed to read username")?,
    };
    let password = match present(&config.api.password) {
        Some(password) => password,
        None => rpassword::prompt_password(format!("Password for {}: ", username))
            .context("Failed to read password")?,
    };

    Ok(Credentials {
        url,
        username,
        password,
    })
}

use anyhow::{bail, Result};
use which::which;

use crate::config::ToolsConfig;
use crate::core::models::SslMode;

/// Checks that every tool the selected mode will invoke resolves on PATH,
/// using the configured spelling's program word. Runs before any mutation.
pub fn verify_or_bail(mode: SslMode, tools: &ToolsConfig) -> Result<()> {
    let mut required = vec![
        tools.apachectl.as_str(),
        tools.systemctl.as_str(),
        tools.enable_module.as_str(),
        tools.enable_site.as_str(),
        tools.disable_site.as_str(),
    ];
    match mode {
        SslMode::SelfSigned => required.push(tools.openssl.as_str()),
        SslMode::LetsEncrypt => required.push(tools.certbot.as_str()),
        SslMode::None => {}
    }

    let mut missing = Vec::new();

    for command in required {
        let program = program_word(command)?;
        match which(&program) {
            Ok(path) => {
                tracing::debug!("Found {}: {:?}", program, path);
            }
            Err(_) => {
                missing.push(program);
            }
        }
    }

    if !missing.is_empty() {
        bail!(
            "Missing required tools: {}. Install them and re-run",
            missing.join(", ")
        );
    }

    tracing::info!("All required tools found");
    Ok(())
}

fn program_word(command: &str) -> Result<String> {
    let words = shell_words::split(command)?;
    match words.into_iter().next() {
        Some(program) => Ok(program),
        None => bail!("Empty tool command in configuration"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_word_takes_first_token() {
        assert_eq!(program_word("sudo certbot").unwrap(), "sudo");
        assert_eq!(program_word("openssl").unwrap(), "openssl");
        assert!(program_word("").is_err());
    }

    #[test]
    fn test_missing_tools_are_reported_by_name() {
        let tools = ToolsConfig {
            apachectl: "siteup_missing_apachectl".to_string(),
            systemctl: "siteup_missing_systemctl".to_string(),
            ..ToolsConfig::default()
        };
        let err = verify_or_bail(SslMode::None, &tools).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("siteup_missing_apachectl"));
        assert!(message.contains("siteup_missing_systemctl"));
    }
}

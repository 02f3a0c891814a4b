use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::core::models::SslMode;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "siteup",
    version,
    about = "Configure an Apache site and TLS certificates for a web application"
)]
pub struct Cli {
    /// Generate a self-signed certificate and enable the TLS site
    #[arg(long = "self-signed", action = ArgAction::SetTrue, conflicts_with = "letsencrypt")]
    pub self_signed: bool,

    /// Obtain a Let's Encrypt certificate for DOMAIN and enable the TLS site
    #[arg(short = 'l', long = "letsencrypt", value_name = "DOMAIN")]
    pub letsencrypt: Option<String>,

    /// Site name for the generated configuration (defaults to the directory name)
    #[arg(short = 's', long = "site", value_name = "NAME")]
    pub site: Option<String>,

    /// Application directory (defaults to the parent of the current directory)
    #[arg(value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Custom configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the run's step results as JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,

    /// Verbose human output
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Debug logs (implies verbose)
    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue)]
    pub debug: bool,
}

impl Cli {
    pub fn ssl_mode(&self) -> SslMode {
        if self.letsencrypt.is_some() {
            SslMode::LetsEncrypt
        } else if self.self_signed {
            SslMode::SelfSigned
        } else {
            SslMode::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes_from_flags() {
        let cli = Cli::try_parse_from(["siteup", "--self-signed"]).unwrap();
        assert_eq!(cli.ssl_mode(), SslMode::SelfSigned);

        let cli = Cli::try_parse_from(["siteup", "--letsencrypt", "example.com"]).unwrap();
        assert_eq!(cli.ssl_mode(), SslMode::LetsEncrypt);
        assert_eq!(cli.letsencrypt.as_deref(), Some("example.com"));

        let cli = Cli::try_parse_from(["siteup"]).unwrap();
        assert_eq!(cli.ssl_mode(), SslMode::None);
    }

    #[test]
    fn test_certificate_flags_are_mutually_exclusive() {
        assert!(
            Cli::try_parse_from(["siteup", "--self-signed", "--letsencrypt", "example.com"])
                .is_err()
        );
    }

    #[test]
    fn test_letsencrypt_requires_a_value() {
        assert!(Cli::try_parse_from(["siteup", "--letsencrypt"]).is_err());
    }

    #[test]
    fn test_positional_directory() {
        let cli = Cli::try_parse_from(["siteup", "--self-signed", "/srv/notes"]).unwrap();
        assert_eq!(cli.directory, Some(PathBuf::from("/srv/notes")));
    }
}

use std::path::PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::SetupError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    None,
    SelfSigned,
    LetsEncrypt,
}

impl SslMode {
    pub fn is_tls(&self) -> bool {
        !matches!(self, SslMode::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::None => "none",
            SslMode::SelfSigned => "self-signed",
            SslMode::LetsEncrypt => "letsencrypt",
        }
    }
}

/// One deployment invocation, built once from parsed arguments.
#[derive(Clone, Debug)]
pub struct DeploymentTarget {
    pub app_dir: PathBuf,
    pub site_name: String,
    pub ssl_mode: SslMode,
    pub domain: Option<String>,
}

impl DeploymentTarget {
    /// Invariant: a domain is required iff the mode is Let's Encrypt.
    pub fn new(
        app_dir: PathBuf,
        site_name: String,
        ssl_mode: SslMode,
        domain: Option<String>,
    ) -> Result<Self, SetupError> {
        match (ssl_mode, &domain) {
            (SslMode::LetsEncrypt, None) => Err(SetupError::InvalidArguments(
                "Let's Encrypt mode requires a domain (--letsencrypt <DOMAIN>)".to_string(),
            )),
            (mode, Some(domain)) if mode != SslMode::LetsEncrypt => {
                Err(SetupError::InvalidArguments(format!(
                    "a domain ({}) is only meaningful with --letsencrypt",
                    domain
                )))
            }
            _ => Ok(Self {
                app_dir,
                site_name,
                ssl_mode,
                domain,
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertIssuer {
    Local,
    Acme,
}

/// Certificate/key pair produced by the provisioner. Never mutated;
/// replaced wholesale on renewal.
#[derive(Clone, Debug, Serialize)]
pub struct CertificateArtifact {
    pub certificate_path: PathBuf,
    pub key_path: PathBuf,
    pub expires_at: Option<DateTime<Utc>>,
    pub issuer: CertIssuer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Success,
    Skipped,
    Failed,
}

#[derive(Clone, Debug, Serialize)]
pub struct StepResult {
    pub name: String,
    pub outcome: StepOutcome,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::SetupError;

    #[test]
    fn test_letsencrypt_requires_domain() {
        let err = DeploymentTarget::new(
            PathBuf::from("/srv/app"),
            "notes".to_string(),
            SslMode::LetsEncrypt,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SetupError::InvalidArguments(_)));
    }

    #[test]
    fn test_domain_rejected_without_letsencrypt() {
        let err = DeploymentTarget::new(
            PathBuf::from("/srv/app"),
            "notes".to_string(),
            SslMode::SelfSigned,
            Some("example.com".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, SetupError::InvalidArguments(_)));
    }

    #[test]
    fn test_valid_targets() {
        assert!(DeploymentTarget::new(
            PathBuf::from("/srv/app"),
            "notes".to_string(),
            SslMode::None,
            None,
        )
        .is_ok());

        let target = DeploymentTarget::new(
            PathBuf::from("/srv/app"),
            "notes".to_string(),
            SslMode::LetsEncrypt,
            Some("example.com".to_string()),
        )
        .unwrap();
        assert_eq!(target.domain.as_deref(), Some("example.com"));
    }
}

use std::fs;
use std::path::Path;

use crate::core::errors::MaterializeError;
use crate::core::models::{CertificateArtifact, DeploymentTarget};
use crate::utils::fs::atomic_write;

/// Ordered token/value pairs. Tokens are `__`-fenced so they cannot collide
/// with legitimate Apache directive text; substitution is literal text
/// replacement, nothing is evaluated or escaped.
pub type Substitutions = Vec<(String, String)>;

pub fn substitutions(
    target: &DeploymentTarget,
    artifact: Option<&CertificateArtifact>,
) -> Substitutions {
    let server_name = target
        .domain
        .clone()
        .unwrap_or_else(|| "localhost".to_string());

    let mut subs = vec![
        ("__SITE_DIR__".to_string(), target.app_dir.display().to_string()),
        ("__SITE_NAME__".to_string(), target.site_name.clone()),
        ("__SERVER_NAME__".to_string(), server_name),
    ];

    // For Let's Encrypt these carry the ACME-issued paths in place of the
    // self-signed defaults.
    if let Some(artifact) = artifact {
        subs.push((
            "__CERT_FILE__".to_string(),
            artifact.certificate_path.display().to_string(),
        ));
        subs.push((
            "__KEY_FILE__".to_string(),
            artifact.key_path.display().to_string(),
        ));
    }

    subs
}

/// Renders `template` into `destination`, leaving the template untouched.
pub fn materialize(
    template: &Path,
    substitutions: &Substitutions,
    destination: &Path,
) -> Result<(), MaterializeError> {
    let text = fs::read_to_string(template).map_err(|source| MaterializeError::TemplateRead {
        path: template.to_path_buf(),
        source,
    })?;

    let mut rendered = text;
    for (token, value) in substitutions {
        rendered = rendered.replace(token.as_str(), value);
    }

    atomic_write(destination, rendered.as_bytes()).map_err(|e| MaterializeError::Write {
        path: destination.to_path_buf(),
        detail: format!("{:#}", e),
    })?;

    tracing::info!("Rendered {:?} -> {:?}", template, destination);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{CertIssuer, SslMode};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const TEMPLATE: &str = "\
<VirtualHost *:443>
    ServerName __SERVER_NAME__
    WSGIScriptAlias / __SITE_DIR__/__SITE_NAME__.wsgi
    SSLCertificateFile __CERT_FILE__
    SSLCertificateKeyFile __KEY_FILE__
</VirtualHost>
";

    fn artifact() -> CertificateArtifact {
        CertificateArtifact {
            certificate_path: PathBuf::from("/etc/ssl/certs/apache-selfsigned.crt"),
            key_path: PathBuf::from("/etc/ssl/private/apache-selfsigned.key"),
            expires_at: None,
            issuer: CertIssuer::Local,
        }
    }

    #[test]
    fn test_every_token_is_replaced_and_template_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("site-ssl.conf.template");
        let destination = dir.path().join("notes-ssl.conf");
        fs::write(&template, TEMPLATE).unwrap();

        let target = DeploymentTarget::new(
            PathBuf::from("/srv/notes"),
            "notes".to_string(),
            SslMode::SelfSigned,
            None,
        )
        .unwrap();
        let artifact = artifact();
        let subs = substitutions(&target, Some(&artifact));

        materialize(&template, &subs, &destination).unwrap();

        let rendered = fs::read_to_string(&destination).unwrap();
        assert!(!rendered.contains("__"));
        assert!(rendered.contains("ServerName localhost"));
        assert!(rendered.contains("WSGIScriptAlias / /srv/notes/notes.wsgi"));
        assert!(rendered.contains("SSLCertificateFile /etc/ssl/certs/apache-selfsigned.crt"));
        assert!(rendered.contains("SSLCertificateKeyFile /etc/ssl/private/apache-selfsigned.key"));

        // The template itself is byte-identical after the call.
        assert_eq!(fs::read_to_string(&template).unwrap(), TEMPLATE);
    }

    #[test]
    fn test_domain_becomes_server_name() {
        let target = DeploymentTarget::new(
            PathBuf::from("/srv/notes"),
            "notes".to_string(),
            SslMode::LetsEncrypt,
            Some("example.com".to_string()),
        )
        .unwrap();
        let subs = substitutions(&target, None);
        assert!(subs.contains(&("__SERVER_NAME__".to_string(), "example.com".to_string())));
    }

    #[test]
    fn test_repeated_tokens_all_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("site.conf.template");
        let destination = dir.path().join("out.conf");
        fs::write(&template, "__SITE_NAME__ and again __SITE_NAME__").unwrap();

        let subs = vec![("__SITE_NAME__".to_string(), "notes".to_string())];
        materialize(&template, &subs, &destination).unwrap();

        assert_eq!(
            fs::read_to_string(&destination).unwrap(),
            "notes and again notes"
        );
    }

    #[test]
    fn test_missing_template_is_template_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = materialize(
            &dir.path().join("absent.template"),
            &Vec::new(),
            &dir.path().join("out.conf"),
        )
        .unwrap_err();
        assert!(matches!(err, MaterializeError::TemplateRead { .. }));
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub paths: PathsConfig,
    pub tools: ToolsConfig,
    pub limits: LimitsConfig,
    /// Apache modules every site needs; "ssl" is appended for TLS modes.
    pub modules: Vec<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            tools: ToolsConfig::default(),
            limits: LimitsConfig::default(),
            modules: vec!["wsgi".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// File expected inside the application directory.
    pub marker_file: String,
    /// Templates, relative to the application directory.
    pub plain_template: PathBuf,
    pub ssl_template: PathBuf,
    /// Server-managed locations.
    pub sites_available: PathBuf,
    pub cert_dir: PathBuf,
    pub key_dir: PathBuf,
    pub letsencrypt_live: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            marker_file: "app.py".to_string(),
            plain_template: PathBuf::from("deploy/site.conf.template"),
            ssl_template: PathBuf::from("deploy/site-ssl.conf.template"),
            sites_available: PathBuf::from("/etc/apache2/sites-available"),
            cert_dir: PathBuf::from("/etc/ssl/certs"),
            key_dir: PathBuf::from("/etc/ssl/private"),
            letsencrypt_live: PathBuf::from("/etc/letsencrypt/live"),
        }
    }
}

/// Tool spellings are full command strings; "sudo certbot" works.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub apachectl: String,
    pub systemctl: String,
    pub openssl: String,
    pub certbot: String,
    pub enable_module: String,
    pub enable_site: String,
    pub disable_site: String,
    /// systemd unit of the web service.
    pub service_unit: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            apachectl: "apache2ctl".to_string(),
            systemctl: "systemctl".to_string(),
            openssl: "openssl".to_string(),
            certbot: "certbot".to_string(),
            enable_module: "a2enmod".to_string(),
            enable_site: "a2ensite".to_string(),
            disable_site: "a2dissite".to_string(),
            service_unit: "apache2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Generous: ACME issuance waits on a remote CA.
    pub command_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 300_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = GlobalConfig::default();
        assert_eq!(config.paths.marker_file, "app.py");
        assert_eq!(config.tools.service_unit, "apache2");
        assert_eq!(config.modules, vec!["wsgi".to_string()]);
        assert_eq!(config.limits.command_timeout_ms, 300_000);
    }

    #[test]
    fn test_partial_yaml_override_keeps_defaults() {
        let yaml = r#"
tools:
  certbot: "sudo certbot"
paths:
  marker_file: "wsgi.py"
"#;
        let config: GlobalConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tools.certbot, "sudo certbot");
        assert_eq!(config.tools.systemctl, "systemctl");
        assert_eq!(config.paths.marker_file, "wsgi.py");
        assert_eq!(
            config.paths.sites_available,
            PathBuf::from("/etc/apache2/sites-available")
        );
    }
}

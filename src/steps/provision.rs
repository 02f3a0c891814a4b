use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::path::Path;

use crate::config::GlobalConfig;
use crate::core::errors::ProvisionError;
use crate::core::models::{CertIssuer, CertificateArtifact};
use crate::executors::command::{run_tool, CommandRunner};

/// Fixed name for the locally generated pair; re-runs overwrite it.
const CERT_NAME: &str = "apache-selfsigned";
const CERT_DAYS: i64 = 365;
/// Locality fields are fixed; only the CN matters and it is always localhost.
const SUBJECT: &str = "/C=DE/ST=Berlin/L=Berlin/O=Example/OU=Ops/CN=localhost";

/// Generates a 2048-bit RSA key and a self-signed certificate at
/// deterministic paths. The key ends up owner-only, the certificate
/// world-readable.
pub async fn self_signed(
    config: &GlobalConfig,
    runner: &dyn CommandRunner,
) -> Result<CertificateArtifact, ProvisionError> {
    let key_path = config.paths.key_dir.join(format!("{}.key", CERT_NAME));
    let cert_path = config.paths.cert_dir.join(format!("{}.crt", CERT_NAME));
    let days = CERT_DAYS.to_string();

    let key_arg = key_path.display().to_string();
    let cert_arg = cert_path.display().to_string();
    let args = [
        "req",
        "-x509",
        "-nodes",
        "-days",
        days.as_str(),
        "-newkey",
        "rsa:2048",
        "-keyout",
        key_arg.as_str(),
        "-out",
        cert_arg.as_str(),
        "-subj",
        SUBJECT,
    ];

    let output = run_tool(runner, &config.tools.openssl, &args)
        .await
        .map_err(|e| ProvisionError::LocalGeneration {
            detail: format!("{:#}", e),
        })?;

    if !output.success() {
        return Err(ProvisionError::LocalGeneration {
            detail: output.stderr_tail(10),
        });
    }

    restrict_permissions(&key_path, &cert_path).map_err(|e| ProvisionError::LocalGeneration {
        detail: format!("failed to set key/certificate permissions: {}", e),
    })?;

    tracing::info!("Self-signed certificate written to {:?}", cert_path);

    Ok(CertificateArtifact {
        certificate_path: cert_path,
        key_path,
        expires_at: Some(Utc::now() + Duration::days(CERT_DAYS)),
        issuer: CertIssuer::Local,
    })
}

/// Delegates issuance to the ACME client in standalone mode. The web
/// service is stopped to free the validation port and brought back on both
/// outcomes; the renewal timer is enabled only after a successful issuance.
/// Re-running with a still-valid certificate is certbot's own no-op.
pub async fn lets_encrypt(
    domain: &str,
    config: &GlobalConfig,
    runner: &dyn CommandRunner,
) -> Result<CertificateArtifact, ProvisionError> {
    service(runner, config, "stop").await?;

    let issuance = run_tool(
        runner,
        &config.tools.certbot,
        &[
            "certonly",
            "--standalone",
            "--non-interactive",
            "--agree-tos",
            "-d",
            domain,
        ],
    )
    .await;

    // The server comes back before we even look at the outcome; a failed
    // issuance must not leave it down.
    let recovery = service(runner, config, "start").await;

    let output = issuance.map_err(|e| ProvisionError::Acme {
        domain: domain.to_string(),
        reason: format!("{:#}", e),
    })?;

    if !output.success() {
        return Err(ProvisionError::Acme {
            domain: domain.to_string(),
            reason: output.stderr_tail(10),
        });
    }

    recovery?;

    let timer = run_tool(
        runner,
        &config.tools.systemctl,
        &["enable", "--now", "certbot.timer"],
    )
    .await
    .map_err(|e| ProvisionError::ServiceControl {
        action: "enable the renewal timer for".to_string(),
        output: format!("{:#}", e),
    })?;
    if !timer.success() {
        return Err(ProvisionError::ServiceControl {
            action: "enable the renewal timer for".to_string(),
            output: timer.stderr_tail(10),
        });
    }

    let live = config.paths.letsencrypt_live.join(domain);

    tracing::info!("ACME certificate available under {:?}", live);

    Ok(CertificateArtifact {
        certificate_path: live.join("fullchain.pem"),
        key_path: live.join("privkey.pem"),
        expires_at: parse_expiry(&output.combined()),
        issuer: CertIssuer::Acme,
    })
}

async fn service(
    runner: &dyn CommandRunner,
    config: &GlobalConfig,
    action: &str,
) -> Result<(), ProvisionError> {
    let unit = config.tools.service_unit.as_str();
    let output = run_tool(runner, &config.tools.systemctl, &[action, unit])
        .await
        .map_err(|e| ProvisionError::ServiceControl {
            action: action.to_string(),
            output: format!("{:#}", e),
        })?;

    if !output.success() {
        return Err(ProvisionError::ServiceControl {
            action: action.to_string(),
            output: output.stderr_tail(10),
        });
    }

    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(key: &Path, cert: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(key, std::fs::Permissions::from_mode(0o600))?;
    std::fs::set_permissions(cert, std::fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_key: &Path, _cert: &Path) -> std::io::Result<()> {
    Ok(())
}

// Certbot reports "This certificate expires on YYYY-MM-DD."
fn parse_expiry(text: &str) -> Option<DateTime<Utc>> {
    let re = Regex::new(r"expires on (\d{4}-\d{2}-\d{2})").ok()?;
    let caps = re.captures(text)?;
    let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

use crate::config::GlobalConfig;
use crate::core::errors::PreconditionError;
use crate::core::models::DeploymentTarget;

/// Ordered environment checks, first failure wins. No side effects.
/// `elevated` is probed by the caller so the ordering stays testable
/// without root.
pub fn verify(
    target: &DeploymentTarget,
    config: &GlobalConfig,
    elevated: bool,
) -> Result<(), PreconditionError> {
    if !elevated {
        return Err(PreconditionError::NotElevated);
    }

    if !target.app_dir.is_dir() {
        return Err(PreconditionError::DirectoryMissing(target.app_dir.clone()));
    }

    let marker = target.app_dir.join(&config.paths.marker_file);
    if !marker.is_file() {
        return Err(PreconditionError::MarkerFileMissing(marker));
    }

    // TLS modes render from the SSL template; plain mode reads its template
    // later and reports a materialization error instead.
    if target.ssl_mode.is_tls() {
        let template = target.app_dir.join(&config.paths.ssl_template);
        if !template.is_file() {
            return Err(PreconditionError::TemplateMissing(template));
        }
    }

    Ok(())
}

pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        true
    }
}

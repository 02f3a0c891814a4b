use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreconditionError {
    #[error("elevated privileges required (re-run with sudo)")]
    NotElevated,

    #[error("application directory not found: {0}")]
    DirectoryMissing(PathBuf),

    #[error("marker file not found: {0} (is this the application directory?)")]
    MarkerFileMissing(PathBuf),

    #[error("site template not found: {0}")]
    TemplateMissing(PathBuf),
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("certificate generation failed: {detail}")]
    LocalGeneration { detail: String },

    #[error("failed to {action} the web service: {output}")]
    ServiceControl { action: String, output: String },

    /// The one step that may legitimately fail on external factors
    /// (DNS, firewall); carries the ACME client's own diagnostics.
    #[error("ACME issuance failed for {domain}: {reason}")]
    Acme { domain: String, reason: String },
}

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("failed to read template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write configuration {path}: {detail}")]
    Write { path: PathBuf, detail: String },
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("{step} failed: {output}")]
    CommandFailed { step: String, output: String },

    #[error("configuration validation failed, service left untouched:\n{output}")]
    ValidationFailed { output: String },

    #[error("service restart failed (site left enabled for inspection): {output}")]
    RestartFailed { output: String },
}

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("{0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SetupError {
    /// Stable exit-code mapping: one code per failure category.
    /// Clap's own usage errors also exit with 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            SetupError::InvalidArguments(_) => 2,
            SetupError::Precondition(_) => 3,
            SetupError::Provision(_) => 4,
            SetupError::Materialize(_) => 5,
            SetupError::Reconcile(_) => 6,
            SetupError::Other(_) => 1,
        }
    }
}

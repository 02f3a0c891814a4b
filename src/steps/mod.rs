pub mod materialize;
pub mod preflight;
pub mod provision;
pub mod reconcile;

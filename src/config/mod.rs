mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{GlobalConfig, LimitsConfig, PathsConfig, ToolsConfig};

//! Persistent sampler defaults stored as TOML under the app directory.

mod errors;
mod load;
mod save;
mod types;

#[cfg(test)]
mod tests;

/// Filename of the settings file inside the `.seedpick` directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub use errors::ConfigError;
pub use load::{config_path, load_from_path, load_or_default};
pub use save::{save, save_to_path};
pub use types::{SamplerSettings, Settings, SourceSettings, StrategyKind};

//! Library exports for the seedpick binary, benchmarks and tests.
/// Application directory resolution.
pub mod app_dirs;
/// Tracing subscriber setup.
pub mod logging;
/// Streaming reservoir sampler over match files.
pub mod sampler;
/// Persistent TOML settings.
pub mod settings;

//! Configuration, secrets, and construction of the sermon chat pipeline.

pub mod bootstrap;
pub mod config;
pub mod vault;

pub use bootstrap::{SermonPipeline, build_pipeline, load_config, resolve_config_path};
pub use config::Config;

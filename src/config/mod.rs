pub mod env;
mod loader;

pub use env::{AppConfig, DirectoryConfig, TranslationConfig};
pub use loader::load_config;

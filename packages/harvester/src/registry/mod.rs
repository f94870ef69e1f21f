//! Jurisdiction registry.
//!
//! Resolves a jurisdiction id to its [`SourceConfig`](crate::types::SourceConfig)
//! and, on demand, to a concrete [`StatuteSource`](crate::sources::StatuteSource).
//! The process-wide registry is exposed through free functions; tests and
//! embedders can build their own [`SourceRegistry`] instead.

mod builtin;
mod core;
mod overlay;

pub use builtin::{builtin_configs, NY_API_BASE_URL};
pub use self::core::{
    create_source, get_all_configs, get_config, get_source, global, list_jurisdictions,
    register_source, SourceRegistry,
};
pub use overlay::{load_overlay_file, load_overlays};

// Public library interface for heattree
// The CLI and the debug-layout tool are thin wrappers over these modules

pub mod config;
pub mod error;
pub mod input;
pub mod layout;
pub mod pipeline;
pub mod render;
pub mod tree;

pub use config::Config;
pub use error::{Result, TreemapError};
pub use pipeline::{prepare_tree, render_document, render_tree, PipelineObserver, Stage};

//! Building block wrapping the AsiteDesign active-site design tool.
//!
//! The scientific computation happens entirely in the wrapped program;
//! this crate stages inputs, merges configuration layers, invokes the
//! tool (natively or inside a container) and archives its outputs.

pub mod archive;
pub mod block;
pub mod command;
pub mod config;
pub mod error;
pub mod launch;
pub mod merge;
pub mod params;
pub mod preset;
mod serde_default;
pub mod staging;

pub use block::Asitedesign;
pub use config::Properties;
pub use error::BlockError;
pub use merge::ReferenceRewrite;

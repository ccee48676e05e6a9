//! Libris kernel: layered settings, the module lifecycle trait, and the
//! registry that drives init/start/stop for registered modules.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;

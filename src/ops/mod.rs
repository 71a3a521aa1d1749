//! High-level operations.
//!
//! This module contains the implementation of the openchamp commands.

pub mod aseprite;
pub mod compile;
pub mod export;
pub mod format;
pub mod variant;

pub use aseprite::{aseprite, AsepriteAction, AsepriteOptions};
pub use compile::{compile, CompileOptions, CompileReport};
pub use export::{export, ExportOptions, ExportPlatform, ExportTarget, ExportType};
pub use format::{format, FormatMode, FormatOptions, FormatReport};
pub use variant::{variant, VariantOptions, VariantOutcome};

//! Command implementations

pub mod aseprite;
pub mod compile;
pub mod completions;
pub mod export;
pub mod format;
pub mod variant;

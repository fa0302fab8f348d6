//! Built-in output parsers and reporters for veritree.

pub mod factory;
pub mod parsers;
pub mod renderers;

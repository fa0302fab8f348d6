//! The verification tree: task nodes, colon-joined paths, filtering and validation.

pub mod filter;
pub mod node;
pub mod path;
pub mod validate;

pub use filter::filter_tree;
pub use node::{CommandSpec, RunSpec, Strategy, VerificationNode, VerificationTree};
pub use path::{join_path, matches_filter, PATH_SEPARATOR};
pub use validate::validate_tree;

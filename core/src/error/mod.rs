#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;

pub use error::{CliError, RunnerError};
pub use executor::ExecutorError;

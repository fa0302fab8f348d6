//! Command executor: one external process per leaf task.

mod command;
mod io_pump;
pub mod process;
mod traits;
pub mod types;

pub use command::{execute_command, SIGTERM_EXIT_CODE};
pub use process::{ProcessHandle, TerminateOutcome};
pub use traits::{DetachedRegistry, ProcessRegistry};
pub use types::{CommandOutcome, CommandRequest, DEFAULT_CAPTURE_BYTES};

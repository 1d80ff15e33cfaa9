//! CLI command handlers for klipconf.
//!
//! Every command loads the session file, runs one operation through the
//! assignment service, and writes the file back. Output is plain text by
//! default and JSON with `--json` where it makes sense for scripting.

pub mod assign;
pub mod boards;
pub mod common;
pub mod config;
pub mod functions;
pub mod generate;
pub mod options;
pub mod session;
pub mod validate;

// Re-export types used by main.rs and tests
pub use assign::{AssignArgs, ClearArgs, ClearPortArgs};
pub use boards::BoardsArgs;
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use functions::FunctionsArgs;
pub use generate::GenerateArgs;
pub use options::{PinOptionsArgs, SetLocationArgs};
pub use session::{SelectBoardArgs, SessionArgs};
pub use validate::ValidateArgs;

//! Path matching, the route table, dispatch, and the allowed-methods
//! responder.
//!
//! Paths are compiled to regexes at registration time: each `:name` segment
//! becomes a capture group, and matching a request extracts the path
//! parameters in one pass. The table is append-only during initialization and
//! read-only afterwards.

mod allowed;
mod core;
mod path;

pub use allowed::AllowedMethodsOptions;
pub use core::{Route, Router};
pub use path::translate_path;

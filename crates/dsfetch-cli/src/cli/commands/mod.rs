//! CLI command handlers, one file per command.

mod bootstrap;
mod fetch;
mod reconcile;
mod report;

pub use bootstrap::run_bootstrap;
pub use fetch::{run_fetch, FetchArgs};
pub use reconcile::run_reconcile;

//! CLI command handlers, one per file.

mod check_config;
mod checksum;
mod completions;
mod init_config;
mod ledger;
mod run;

pub use check_config::run_check_config;
pub use checksum::run_checksum;
pub use completions::run_completions;
pub use init_config::run_init_config;
pub use ledger::run_ledger;
pub use run::run_loop;

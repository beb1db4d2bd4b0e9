// ABOUTME: Command module aggregator for the caravel CLI.
// ABOUTME: Re-exports deploy, status, and watch command handlers.

mod deploy;
mod sandbox;
mod status;
mod watch;

pub use deploy::{DeployOptions, deploy};
pub use sandbox::sandbox;
pub use status::status;
pub use watch::watch;

//! Site build pipeline on top of the `preprocessor` engine.
//!
//! The builder owns everything around the expansion engine: `site.toml`
//! configuration, the one-shot build pass that mirrors a source tree into
//! an output tree, the polling watch loop, and logging setup. The engine
//! itself stays pure; all filesystem policy lives here.

pub mod config;
pub mod error;
pub mod logging;
pub mod site;
pub mod watch;

pub use config::{SiteConfig, WatchConfig, CONFIG_FILE};
pub use error::BuildError;
pub use site::{build_site, BuildStats};
pub use watch::watch;

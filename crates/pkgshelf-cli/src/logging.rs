//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const fn default_directives(verbose: bool) -> &'static str {
    if verbose { "pkgshelf=debug,info" } else { "pkgshelf=info,warn" }
}

/// Install the global fmt subscriber. `RUST_LOG` overrides the defaults.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

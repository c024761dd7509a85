//! Tracing setup
//!
//! The subscriber is installed before the config file is read so that
//! config loading can log. It starts at `info`, and the filter is swapped
//! for the configured level once the config is known. `RUST_LOG`, when set,
//! wins over both.

use tracing_subscriber::reload;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Level used until the config file has been read
pub const BOOTSTRAP_LEVEL: &str = "info";

/// Handle for replacing the active filter
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Filter directives for a given level
pub fn default_filter(level: &str) -> String {
    format!("vocab_images={0},vocab_common={0},tower_http=info", level)
}

/// Install the global subscriber and return the filter handle
pub fn init_tracing() -> FilterHandle {
    let initial = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(BOOTSTRAP_LEVEL)));
    let (filter, handle) = reload::Layer::new(initial);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    handle
}

/// Switch the active filter to the configured level
pub fn set_level<S>(handle: &reload::Handle<EnvFilter, S>, level: &str) -> Result<(), reload::Error> {
    handle.reload(EnvFilter::new(default_filter(level)))
}

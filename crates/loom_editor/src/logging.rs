// SPDX-License-Identifier: MIT OR Apache-2.0
//! Logging setup.

use crate::settings::EditorSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the settings' filter. Returns `false` if a subscriber
/// was already installed.
pub fn init(settings: &EditorSettings) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let settings = EditorSettings::default();
        let _ = init(&settings);
        assert!(!init(&settings));
    }
}

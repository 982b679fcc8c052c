//! Centralized, environment-driven configuration (§6.5).
//!
//! Only operational knobs live here — nothing that would change on-disk
//! semantics (record framing, CRC chaining, segment naming are not
//! configurable). `WalConfig::from_env()` reads the same env vars a fluent
//! builder can override.

#[derive(Clone, Debug, Default)]
pub struct WalConfig {
    /// Skip fsync on `save`/`save_snapshot`/`cut`. Never enable against real
    /// data — intended for test harnesses and benchmarks.
    /// Env: RAFTWAL_DISABLE_FSYNC (default false; "1|true|on|yes" => true)
    pub disable_fsync: bool,

    /// Default `require_all` passed to `open` when a caller does not specify
    /// one explicitly.
    /// Env: RAFTWAL_REQUIRE_ALL_SEGMENTS (default false)
    pub require_all_segments: bool,
}

impl WalConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("RAFTWAL_DISABLE_FSYNC") {
            cfg.disable_fsync = truthy(&v);
        }
        if let Ok(v) = std::env::var("RAFTWAL_REQUIRE_ALL_SEGMENTS") {
            cfg.require_all_segments = truthy(&v);
        }

        cfg
    }

    pub fn with_disable_fsync(mut self, on: bool) -> Self {
        self.disable_fsync = on;
        self
    }

    pub fn with_require_all_segments(mut self, on: bool) -> Self {
        self.require_all_segments = on;
        self
    }
}

fn truthy(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes")
}

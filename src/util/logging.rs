//! # Logging Helpers
//!
//! Log-spam control for the telegram path. EnOcean sensors repeat the same
//! telegram every few minutes, so a device stuck in an invalid state would
//! otherwise flood the log with identical warnings.
//!
//! - [`LogThrottle`] caps messages per time window
//! - [`WarnOnce`] lets a warning fire once per key until it is cleared
//! - [`log_telegram_hex`] dumps payload bytes at debug level

use std::collections::HashSet;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Caps how many messages pass per time window.
#[derive(Debug)]
pub struct LogThrottle {
    window: Duration,
    cap: u32,
    count: u32,
    window_start: Option<Instant>,
}

impl LogThrottle {
    /// ```rust
    /// use enocean_rs::util::logging::LogThrottle;
    /// use std::time::{Duration, Instant};
    ///
    /// // five messages per second
    /// let mut throttle = LogThrottle::new(Duration::from_secs(1), 5);
    /// assert!(throttle.allow(Instant::now()));
    /// ```
    pub fn new(window: Duration, cap: u32) -> Self {
        Self {
            window,
            cap,
            count: 0,
            window_start: None,
        }
    }

    /// Count one message at `now` and report whether it may be logged.
    /// Messages dropped in the previous window are reported when a new one
    /// opens.
    pub fn allow(&mut self, now: Instant) -> bool {
        let expired = self
            .window_start
            .map_or(true, |start| now.saturating_duration_since(start) >= self.window);
        if expired {
            if self.count > self.cap {
                log::warn!("{} similar warnings suppressed", self.count - self.cap);
            }
            self.window_start = Some(now);
            self.count = 0;
        }

        self.count = self.count.saturating_add(1);
        self.count <= self.cap
    }

    /// Messages dropped so far in the current window.
    pub fn suppressed(&self) -> u32 {
        self.count.saturating_sub(self.cap)
    }
}

/// Remembers which keys already produced a warning.
#[derive(Debug)]
pub struct WarnOnce<K> {
    seen: HashSet<K>,
}

impl<K: Eq + Hash> WarnOnce<K> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Returns `true` the first time `key` is seen.
    pub fn first(&mut self, key: K) -> bool {
        self.seen.insert(key)
    }

    /// Re-arm the warning for `key`.
    pub fn clear(&mut self, key: &K) {
        self.seen.remove(key);
    }

    pub fn clear_all(&mut self) {
        self.seen.clear();
    }
}

impl<K: Eq + Hash> Default for WarnOnce<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Log telegram payload bytes in hex at debug level
pub fn log_telegram_hex(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 32;

    let display_data = &data[..data.len().min(MAX_LOG_BYTES)];
    let hex_str = crate::util::hex::format_hex_compact(display_data);
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    log::debug!("{prefix}: {hex_str}{suffix}");
}

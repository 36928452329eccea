//! # Protocol Logging Utilities
//!
//! Logging helpers for the SKSTACK line protocol: escaped rendering of
//! received bytes, hex dumps for binary payloads, and rate limiting for
//! messages a chattering module could otherwise repeat endlessly.
//!
//! ## Usage
//!
//! ```rust
//! use skstack_rs::util::logging::{escape_line, LogThrottle};
//! use std::time::Duration;
//!
//! assert_eq!(escape_line(b"OK\r\n"), "OK\\r\\n");
//!
//! let mut throttle = LogThrottle::new(Duration::from_secs(1), 5);
//! if throttle.allow() {
//!     log::debug!("discarding unsolicited line");
//! }
//! ```

use std::time::{Duration, Instant};

/// Received chunks longer than this are truncated in trace output
const MAX_LOG_BYTES: usize = 96;

/// Caps how many messages of one kind are logged per time window.
///
/// Messages over the cap are counted; the count is reported once when the
/// next window opens.
#[derive(Debug)]
pub struct LogThrottle {
    window: Duration,
    cap: u32,
    count: u32,
    suppressed: u64,
    started: Instant,
}

impl LogThrottle {
    pub fn new(window: Duration, cap: u32) -> Self {
        Self {
            window,
            cap,
            count: 0,
            suppressed: 0,
            started: Instant::now(),
        }
    }

    /// Whether the next message may be logged.
    pub fn allow(&mut self) -> bool {
        if self.started.elapsed() > self.window {
            if self.suppressed > 0 {
                log::debug!("{} similar messages suppressed", self.suppressed);
            }
            self.started = Instant::now();
            self.count = 0;
            self.suppressed = 0;
        }

        if self.count < self.cap {
            self.count += 1;
            true
        } else {
            self.suppressed += 1;
            false
        }
    }

    /// Messages dropped in the current window
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}

/// Render protocol bytes as printable text, escaping CR, LF and non-ASCII.
pub fn escape_line(data: &[u8]) -> String {
    data.escape_ascii().to_string()
}

/// Trace a chunk received from the transport.
pub fn log_received(data: &[u8]) {
    if !log::log_enabled!(log::Level::Trace) {
        return;
    }

    let shown = &data[..data.len().min(MAX_LOG_BYTES)];
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    if shown.iter().all(|b| b.is_ascii_graphic() || b" \r\n".contains(b)) {
        log::trace!(target: "skstack::rx", "< {}{suffix}", escape_line(shown));
    } else {
        log::trace!(
            target: "skstack::rx",
            "< {} bytes{suffix}\n{}",
            data.len(),
            crate::util::hex::pretty_hex(shown, 16)
        );
    }
}

/// Log a command line being sent, using its masked display form.
pub fn log_sent(display: &str) {
    log::debug!(target: "skstack::tx", "> {display}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_caps_messages() {
        let mut throttle = LogThrottle::new(Duration::from_secs(60), 3);

        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(!throttle.allow());
        assert!(!throttle.allow());
        assert_eq!(throttle.suppressed(), 2);
    }

    #[test]
    fn test_throttle_new_window() {
        let mut throttle = LogThrottle::new(Duration::ZERO, 1);
        assert!(throttle.allow());
        std::thread::sleep(Duration::from_millis(2));
        assert!(throttle.allow());
        assert_eq!(throttle.suppressed(), 0);
    }

    #[test]
    fn test_escape_line() {
        assert_eq!(escape_line(b"EVENT C0\r\n"), "EVENT C0\\r\\n");
        assert_eq!(escape_line(&[0x00, b'A']), "\\x00A");
    }

    #[test]
    fn test_log_helpers_do_not_panic() {
        log_received(b"OK\r\n");
        log_received(&[0u8; 200]);
        log_sent("SKSETPWD C ********");
    }
}

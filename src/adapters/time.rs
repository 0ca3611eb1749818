//! ESP32 time adapter.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` (monotonic,
//!   microsecond precision) and `gettimeofday()` (wall clock, valid once
//!   SNTP has synced).
//! - **`not(target_os = "espidf")`**: uses `std::time` for host-side
//!   testing and simulation.

/// Wall clock values before 2020-01-01 mean "never synced".
const EPOCH_2020_SECS: i64 = 1_577_836_800;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a read of the high-resolution timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Milliseconds since the Unix epoch, `None` if the wall clock has not
    /// been synced.
    #[cfg(target_os = "espidf")]
    pub fn unix_time_ms(&self) -> Option<u64> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: tv is a valid out-pointer; timezone argument may be null.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        let secs = tv.tv_sec as i64;
        if secs < EPOCH_2020_SECS {
            return None;
        }
        Some(secs as u64 * 1_000 + tv.tv_usec as u64 / 1_000)
    }

    /// Milliseconds since the Unix epoch from the host clock.
    #[cfg(not(target_os = "espidf"))]
    pub fn unix_time_ms(&self) -> Option<u64> {
        let since = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?;
        if (since.as_secs() as i64) < EPOCH_2020_SECS {
            return None;
        }
        Some(since.as_millis() as u64)
    }

    /// Map a monotonic timestamp onto the wall clock, if synced.
    pub fn to_unix_ms(&self, uptime_ms: u64) -> Option<u64> {
        let now_unix = self.unix_time_ms()?;
        let now_up = self.uptime_ms();
        Some(now_unix.saturating_sub(now_up.saturating_sub(uptime_ms)))
    }
}

//! HTTP GET request builder for the log server.
//!
//! Two endpoints, both plain query strings:
//!
//! ```text
//!   {base}/medication?device_id=MR-4D4544&status=confirmed&timestamp=…
//!   {base}/envlog?device_id=MR-4D4544&temperature=22.5&humidity=45.0&status=optimal&timestamp=…
//! ```
//!
//! `timestamp` is naive UTC in the server's own `isoformat()` shape
//! (`YYYY-MM-DDTHH:MM:SS.ffffff`) so rows it stamps itself and rows the
//! device stamps sort together.  The clock only has millisecond
//! resolution, so the last three digits are always zero.  It is omitted when the wall clock is not
//! synced and the server stamps on arrival.

use core::fmt::Write;

use crate::app::ports::UplinkRecord;
use crate::error::CommsError;

/// Maximum request URL length.
pub const MAX_URL_LEN: usize = 256;

/// A fully built request URL.
pub type RequestUrl = heapless::String<MAX_URL_LEN>;

/// Rendered timestamp, e.g. `2024-05-01T08:30:00.000000`.
pub type Timestamp = heapless::String<32>;

/// Status value reported with a dose confirmation.
pub const STATUS_CONFIRMED: &str = "confirmed";

/// Endpoint path for a record.
pub fn endpoint(record: &UplinkRecord) -> &'static str {
    match record {
        UplinkRecord::DoseConfirmed { .. } => "/medication",
        UplinkRecord::Environment { .. } => "/envlog",
    }
}

/// Build the GET URL for `record`.
///
/// `unix_ms` is the record's wall-clock time, `None` when unsynced.
pub fn build_url(
    base_url: &str,
    device_id: &str,
    record: &UplinkRecord,
    unix_ms: Option<u64>,
) -> Result<RequestUrl, CommsError> {
    let mut q = QueryWriter::new(base_url.trim_end_matches('/'), endpoint(record))?;
    q.param("device_id", device_id)?;

    match record {
        UplinkRecord::DoseConfirmed { .. } => {
            q.param("status", STATUS_CONFIRMED)?;
        }
        UplinkRecord::Environment {
            temperature,
            humidity,
            classification,
            ..
        } => {
            let mut num = heapless::String::<16>::new();
            write!(num, "{:.1}", temperature).map_err(|_| CommsError::PayloadTooLarge)?;
            q.param("temperature", &num)?;
            num.clear();
            write!(num, "{:.1}", humidity).map_err(|_| CommsError::PayloadTooLarge)?;
            q.param("humidity", &num)?;
            q.param("status", classification.as_str())?;
        }
    }

    if let Some(ms) = unix_ms {
        q.param("timestamp", &format_timestamp(ms))?;
    }
    Ok(q.finish())
}

/// Render Unix milliseconds as `YYYY-MM-DDTHH:MM:SS.ffffff` (UTC).
pub fn format_timestamp(unix_ms: u64) -> Timestamp {
    let secs = unix_ms / 1_000;
    let micros = (unix_ms % 1_000) * 1_000;
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);

    let mut out = Timestamp::new();
    let _ = write!(
        out,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:06}",
        year,
        month,
        day,
        rem / 3_600,
        (rem % 3_600) / 60,
        rem % 60,
        micros
    );
    out
}

/// Days since 1970-01-01 to proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

// ── Query string writer ───────────────────────────────────────

struct QueryWriter {
    url: RequestUrl,
    has_params: bool,
}

impl QueryWriter {
    fn new(base: &str, path: &str) -> Result<Self, CommsError> {
        let mut url = RequestUrl::new();
        url.push_str(base).map_err(|_| CommsError::PayloadTooLarge)?;
        url.push_str(path).map_err(|_| CommsError::PayloadTooLarge)?;
        Ok(Self {
            url,
            has_params: false,
        })
    }

    fn param(&mut self, key: &str, value: &str) -> Result<(), CommsError> {
        let sep = if self.has_params { '&' } else { '?' };
        self.has_params = true;
        self.push(sep)?;
        for b in key.bytes().chain(core::iter::once(b'=')) {
            self.push(b as char)?;
        }
        for b in value.bytes() {
            if is_unreserved(b) {
                self.push(b as char)?;
            } else {
                write!(self.url, "%{:02X}", b).map_err(|_| CommsError::PayloadTooLarge)?;
            }
        }
        Ok(())
    }

    fn push(&mut self, c: char) -> Result<(), CommsError> {
        self.url.push(c).map_err(|_| CommsError::PayloadTooLarge)
    }

    fn finish(self) -> RequestUrl {
        self.url
    }
}

/// RFC 3986 unreserved set.
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::EnvironmentClass;

    const BASE: &str = "http://192.168.1.100:5000";

    #[test]
    fn medication_without_clock() {
        let url = build_url(
            BASE,
            "MR-4D4544",
            &UplinkRecord::DoseConfirmed { timestamp_ms: 15_300 },
            None,
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://192.168.1.100:5000/medication?device_id=MR-4D4544&status=confirmed"
        );
    }

    #[test]
    fn envlog_with_clock() {
        let record = UplinkRecord::Environment {
            temperature: 22.46,
            humidity: 45.0,
            classification: EnvironmentClass::Optimal,
            timestamp_ms: 15_300,
        };
        let url = build_url("http://srv:5000/", "MR-AABBCC", &record, Some(1_700_000_000_123)).unwrap();
        assert_eq!(
            url.as_str(),
            "http://srv:5000/envlog?device_id=MR-AABBCC&temperature=22.5&humidity=45.0\
             &status=optimal&timestamp=2023-11-14T22%3A13%3A20.123000"
        );
    }

    #[test]
    fn negative_temperature_keeps_sign() {
        let record = UplinkRecord::Environment {
            temperature: -3.2,
            humidity: 80.0,
            classification: EnvironmentClass::Danger,
            timestamp_ms: 0,
        };
        let url = build_url(BASE, "MR-000000", &record, None).unwrap();
        assert!(url.contains("temperature=-3.2&humidity=80.0&status=danger"));
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let url = build_url(
            BASE,
            "a b&c",
            &UplinkRecord::DoseConfirmed { timestamp_ms: 0 },
            None,
        )
        .unwrap();
        assert!(url.contains("device_id=a%20b%26c&"));
    }

    #[test]
    fn oversized_base_is_rejected() {
        let base: String = core::iter::repeat_n('x', MAX_URL_LEN).collect();
        let res = build_url(&base, "id", &UplinkRecord::DoseConfirmed { timestamp_ms: 0 }, None);
        assert_eq!(res, Err(CommsError::PayloadTooLarge));
    }

    #[test]
    fn timestamp_epoch() {
        assert_eq!(format_timestamp(0).as_str(), "1970-01-01T00:00:00.000000");
    }

    #[test]
    fn timestamp_leap_day() {
        // 2000-02-29T12:00:00Z
        assert_eq!(
            format_timestamp(951_825_600_000).as_str(),
            "2000-02-29T12:00:00.000000"
        );
    }

    #[test]
    fn timestamp_year_end() {
        // 2023-12-31T23:59:59.999Z
        assert_eq!(
            format_timestamp(1_704_067_199_999).as_str(),
            "2023-12-31T23:59:59.999000"
        );
    }
}

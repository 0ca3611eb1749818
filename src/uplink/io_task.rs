//! Async uploader task: drains the uplink channel into HTTP GETs.
//!
//! Runs in a dedicated thread using `edge-executor` with `async-io-mini`
//! timers.  One future:
//!
//! - **Send**: truly async via `UPLINK_CHANNEL.receive().await` (wakes
//!   as soon as the control loop enqueues a record), then a paced GET.
//!
//! A server URL changed at runtime arrives through
//! [`UPLINK_TARGET`](super::channels::UPLINK_TARGET) and applies from the
//! next record.
//!
//! Delivery is best effort: a record that arrives while the link is down,
//! or whose request fails, is logged and dropped.  Nothing is retried.
//!
//! ```text
//!  ┌──────────────────────────────────────────────┐
//!  │  Uploader Thread (Core 0)                    │
//!  │  ┌────────────────────────────────────────┐  │
//!  │  │  futures_lite::block_on                │  │
//!  │  │  ┌──────────────────────────────────┐  │  │
//!  │  │  │  edge_executor::LocalExecutor    │  │  │
//!  │  │  │  ┌────────────────────────────┐  │  │  │
//!  │  │  │  │ receive → GET → pace ⏱     │  │  │  │
//!  │  │  │  └────────────────────────────┘  │  │  │
//!  │  │  └──────────────────────────────────┘  │  │
//!  │  └────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────┘
//! ```

use core::time::Duration;

use log::{debug, info, warn};

use crate::adapters::device_id::DeviceIdString;
use crate::error::CommsError;

use super::channels::{UplinkChannel, UplinkMsg, UplinkTarget};
use super::query::build_url;

/// Gap between consecutive requests.
pub const SEND_PACING: Duration = Duration::from_millis(250);

/// Per-request timeout on device.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimal blocking HTTP GET, returning the response status.
pub trait HttpGet {
    fn get(&mut self, url: &str) -> Result<u16, CommsError>;
}

/// Where records go.
#[derive(Debug, Clone)]
pub struct UplinkContext {
    pub base_url: super::channels::ServerUrl,
    pub device_id: DeviceIdString,
}

// ── HTTP clients ─────────────────────────────────────────────

/// ESP-IDF HTTP client; one connection per request.
#[cfg(target_os = "espidf")]
pub struct EspHttpGet {
    timeout: Duration,
}

#[cfg(target_os = "espidf")]
impl EspHttpGet {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[cfg(target_os = "espidf")]
impl HttpGet for EspHttpGet {
    fn get(&mut self, url: &str) -> Result<u16, CommsError> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(self.timeout),
            ..Default::default()
        })
        .map_err(|e| CommsError::HttpFailed(e.code()))?;
        conn.initiate_request(Method::Get, url, &[])
            .map_err(|e| CommsError::HttpFailed(e.code()))?;
        conn.initiate_response()
            .map_err(|e| CommsError::HttpFailed(e.code()))?;
        Ok(conn.status())
    }
}

/// Host stand-in: logs the request and reports success.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct LogHttpGet;

#[cfg(not(target_os = "espidf"))]
impl HttpGet for LogHttpGet {
    fn get(&mut self, url: &str) -> Result<u16, CommsError> {
        info!("HTTP(sim): GET {}", url);
        Ok(200)
    }
}

// ── Delivery ─────────────────────────────────────────────────

/// Build the request for `msg` and perform it.  Non-2xx is an error.
pub fn deliver<H: HttpGet>(
    http: &mut H,
    ctx: &UplinkContext,
    msg: &UplinkMsg,
) -> Result<u16, CommsError> {
    let url = build_url(&ctx.base_url, &ctx.device_id, &msg.record, msg.unix_ms)?;
    debug!("uplink: GET {}", url);
    let status = http.get(&url)?;
    if (200..300).contains(&status) {
        Ok(status)
    } else {
        Err(CommsError::HttpFailed(status as i32))
    }
}

/// Send loop.  `link_up` and `target` are consulted per record.
async fn uplink_loop<H: HttpGet>(
    channel: &'static UplinkChannel,
    target: &'static UplinkTarget,
    mut http: H,
    mut ctx: UplinkContext,
    link_up: fn() -> bool,
    pacing: Duration,
) {
    loop {
        let msg = channel.receive().await;

        if let Some(url) = target.try_take() {
            info!("uplink: server is now {}", url);
            ctx.base_url = url;
        }

        if !link_up() {
            warn!("uplink: link down, dropping {:?}", msg.record);
            continue;
        }

        match deliver(&mut http, &ctx, &msg) {
            Ok(status) => info!("uplink: {:?} delivered ({})", msg.record, status),
            Err(e) => warn!("uplink: {:?} not delivered: {}", msg.record, e),
        }

        if !pacing.is_zero() {
            async_io_mini::Timer::after(pacing).await;
        }
    }
}

/// Entry point for the uploader thread.
fn run_uplink_loop<H: HttpGet>(
    channel: &'static UplinkChannel,
    target: &'static UplinkTarget,
    http: H,
    ctx: UplinkContext,
    link_up: fn() -> bool,
) {
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();

    info!(
        "Uploader started (server={}, device={})",
        ctx.base_url, ctx.device_id
    );
    executor
        .spawn(uplink_loop(channel, target, http, ctx, link_up, SEND_PACING))
        .detach();

    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

// ── Thread spawn ─────────────────────────────────────────────

/// Spawn the uploader in a dedicated thread pinned to Core 0 (PRO_CPU),
/// next to lwIP.
pub fn spawn<H>(
    channel: &'static UplinkChannel,
    target: &'static UplinkTarget,
    http: H,
    ctx: UplinkContext,
    link_up: fn() -> bool,
) -> std::io::Result<std::thread::JoinHandle<()>>
where
    H: HttpGet + Send + 'static,
{
    crate::drivers::task_pin::spawn_on_core(
        crate::drivers::task_pin::Core::Pro,
        5,
        8,
        "uplink\0",
        move || run_uplink_loop(channel, target, http, ctx, link_up),
    )
}

// ── Tests ────────────────────────────────────────────────────

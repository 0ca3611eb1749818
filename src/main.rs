//! MedAlert Firmware: Main Entry Point
//!
//! Hexagonal architecture with a fixed-rate control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareIndicators  BleAdapter       NvsAdapter   DhtSensor   │
//! │  (IndicatorPort)     (Notification)   (Config+Ack) (Env)       │
//! │  QueuedUplink ──▶ uploader thread ──▶ HTTP log server          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM · debounce · reminders · confirmation fan-out     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  EffectRouter (effects → ports) · WifiAdapter (backoff)        │
//! │  BLE config writes ──▶ UpdateConfig ──▶ ConfigFollower         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::EspWifi;

use medalert::adapters::ble::{self, BleAdapter};
use medalert::adapters::device_id;
use medalert::adapters::hardware::HardwareIndicators;
use medalert::adapters::log_sink::LogEventSink;
use medalert::adapters::nvs::NvsAdapter;
use medalert::adapters::provisioning::{self, ConfigFollower};
use medalert::adapters::time::Esp32TimeAdapter;
use medalert::adapters::uplink::QueuedUplink;
use medalert::adapters::wifi::{ConnectivityPort, WifiAdapter};
use medalert::app::commands::AppCommand;
use medalert::app::effects::EffectRouter;
use medalert::app::ports::{ConfigPort, ConfirmationPort};
use medalert::app::service::{AppService, TickInput};
use medalert::config::ReminderConfig;
use medalert::drivers::button::AckButton;
use medalert::drivers::hw_init::{self, OpenDrainPin};
use medalert::drivers::watchdog::{self, Watchdog};
use medalert::events::{self, Event};
use medalert::fsm::DosePhase;
use medalert::pins;
use medalert::sensors::dht::DhtSensor;
use medalert::uplink::channels::{self, UPLINK_CHANNEL, UPLINK_TARGET};
use medalert::uplink::io_task::{self, EspHttpGet, UplinkContext, HTTP_TIMEOUT};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  MedAlert v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::volatile()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            ReminderConfig::default()
        }
    };
    match nvs.load_confirmation() {
        Ok(flag) => info!("Last dose confirmed before reset: {}", flag),
        Err(e) => warn!("Confirmation flag unreadable: {}", e),
    }

    // ── 3. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals(config.buzzer_tone_hz) {
        // Without indicators the device cannot alert; the task watchdog
        // is not armed yet, so spin until the supervisor resets us.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed: {}; short taps may be missed", e);
    }
    let watchdog = Watchdog::new(watchdog::DEFAULT_TIMEOUT_MS);

    // ── 4. Device identity ────────────────────────────────────
    let mac = device_id::read_mac();
    let dev_id = device_id::device_id(&mac);
    let dev_hostname = device_id::hostname(&mac);
    info!("Device ID: {} (hostname: {})", dev_id, dev_hostname);

    // ── 5. Wireless ───────────────────────────────────────────
    let mut ble = BleAdapter::new(dev_hostname.clone());
    if let Err(e) = ble.start() {
        warn!("BLE unavailable ({}); reminders will not be delivered", e);
    }

    // The driver is attached even without an SSID so credentials written
    // over BLE later can connect without a reboot.
    let clock = Esp32TimeAdapter::new();
    let mut wifi = WifiAdapter::new();
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    wifi.attach_driver(EspWifi::new(peripherals.modem, sysloop, None)?);
    if config.wifi_ssid.is_empty() {
        info!("WiFi: no SSID configured, waiting for provisioning over BLE");
    } else {
        match wifi.set_credentials(&config.wifi_ssid, &config.wifi_password) {
            Ok(()) => {
                if let Err(e) = wifi.connect(clock.uptime_ms()) {
                    warn!("WiFi: first connect failed ({}), retrying in background", e);
                }
            }
            Err(e) => warn!("WiFi: stored credentials rejected ({})", e),
        }
    }
    let _sntp = match EspSntp::new_default() {
        Ok(sntp) => Some(sntp),
        Err(e) => {
            warn!("SNTP unavailable ({}); records go without timestamps", e);
            None
        }
    };

    // ── 6. Uploader thread ────────────────────────────────────
    let ctx = UplinkContext {
        base_url: config.server_url.clone(),
        device_id: dev_id.clone(),
    };
    let _uploader = io_task::spawn(
        &UPLINK_CHANNEL,
        &UPLINK_TARGET,
        EspHttpGet::new(HTTP_TIMEOUT),
        ctx,
        channels::network_up,
    )?;

    // ── 7. Construct adapters ─────────────────────────────────
    let mut uplink = QueuedUplink::new(
        &UPLINK_CHANNEL,
        Esp32TimeAdapter::new(),
        config.uplink_enabled,
        channels::network_up,
    );
    let mut indicators = HardwareIndicators::new(config.alert_pattern);
    let mut dht = DhtSensor::new(OpenDrainPin::new(pins::DHT_DATA_GPIO), Ets, config.dht_model);
    let mut log_sink = LogEventSink::new();
    let mut button = AckButton::new(pins::ACK_BUTTON_GPIO);

    // ── 8. Construct app service ──────────────────────────────
    let mut app = AppService::new(config.clone(), clock.uptime_ms())?;
    let effects = app.start(&mut log_sink);
    EffectRouter {
        indicators: &mut indicators,
        notifier: &mut ble,
        store: &mut nvs,
        uplink: &mut uplink,
    }
    .apply(&effects);

    info!("System ready. Entering control loop.");

    // ── 9. Control loop ───────────────────────────────────────
    let interval_ms = config.control_loop_interval_ms;
    // What the adapters currently follow; catches up on each auto-save.
    let mut applied = config;

    loop {
        std::thread::sleep(std::time::Duration::from_millis(interval_ms as u64));
        let now_ms = clock.uptime_ms();

        events::drain_events(|event| match event {
            Event::PeerConnected => ble.on_central_connected(),
            Event::PeerDisconnected => ble.on_central_disconnected(),
            Event::NetworkUp => info!("Uplink: network up"),
            Event::NetworkDown => info!("Uplink: network down"),
        });

        // Companion-app config writes; persisted by the auto-save below.
        while let Some(raw) = ble.take_config_write() {
            match provisioning::decode_config_write(&app.current_config(), &raw) {
                Ok(next) => {
                    let command = AppCommand::UpdateConfig(next);
                    let _ = app.handle_command(command, now_ms, &mut log_sink);
                }
                Err(e) => warn!("BLE: config write rejected ({})", e),
            }
        }

        // A long press after the dose was taken opens the next cycle.  The
        // press that confirmed the dose is not one: the button is re-armed.
        let sample = button.sample(now_ms);
        let phase_before = app.phase();
        let effects = if sample.long_press && phase_before == DosePhase::Confirmed {
            info!("Button: long press → new dose cycle");
            app.handle_command(AppCommand::StartCycle, now_ms, &mut log_sink)
        } else {
            app.tick(
                TickInput {
                    now_ms,
                    ack_pressed: sample.pressed,
                    peer_connected: ble::peer_connected(),
                },
                &mut dht,
                &mut log_sink,
            )
        };
        if phase_before != DosePhase::Confirmed && app.phase() == DosePhase::Confirmed {
            button.rearm();
        }

        EffectRouter {
            indicators: &mut indicators,
            notifier: &mut ble,
            store: &mut nvs,
            uplink: &mut uplink,
        }
        .apply(&effects);

        indicators.advance(interval_ms);

        // WiFi reconnection poll (exponential backoff).
        wifi.poll(now_ms);

        // Config auto-save (5 s debounce after last change).
        if app.auto_save_if_needed(now_ms, &nvs) {
            let saved = app.current_config();
            ConfigFollower {
                indicators: &mut indicators,
                uplink: &mut uplink,
                wifi: &mut wifi,
                target: &UPLINK_TARGET,
            }
            .follow(&applied, &saved, now_ms);
            applied = saved;
        }

        watchdog.feed();
    }
}

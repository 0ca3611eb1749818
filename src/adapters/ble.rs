//! BLE notification adapter.
//!
//! Implements [`NotificationPort`]: it pushes reminder and confirmation
//! messages to a connected companion app.  The same service takes
//! configuration writes from the app, handed to the main loop through
//! [`BleAdapter::take_config_write`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via raw
//!   `esp_idf_svc::sys` calls.
//! - **all other targets**: simulation that records every notification
//!   for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID                        | Perms       |
//! |----------------|-----------------------------|-------------|
//! | Dose Alert     | `6d610002-…-c3b51e0f4a27`   | Read+Notify |
//! | Config         | `6d610003-…-c3b51e0f4a27`   | Write       |
//!
//! Payload is one JSON object per notification:
//! `{"seq":3,"kind":"reminder","msg":"Time to take your medication (#3)"}`
//!
//! ## MTU
//!
//! The server offers [`LOCAL_MTU`] and tracks what each client settles on.
//! At the default ATT MTU of 23 a notification carries only 20 bytes,
//! shorter than any payload, so clients have to negotiate.  A payload that
//! does not fit the negotiated MTU is refused, never truncated.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};
use serde::Serialize;

use crate::app::effects::NotificationKind;
use crate::app::ports::NotificationPort;
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x6d610001_8e2a_4c7d_9b13_c3b51e0f4a27;
pub const CHAR_DOSE_ALERT: u128 = 0x6d610002_8e2a_4c7d_9b13_c3b51e0f4a27;
pub const CHAR_CONFIG: u128 = 0x6d610003_8e2a_4c7d_9b13_c3b51e0f4a27;

/// Upper bound on a notification body, whatever the MTU.
pub const MAX_PAYLOAD_BYTES: usize = 128;

/// ATT MTU before the client negotiates.
pub const DEFAULT_ATT_MTU: u16 = 23;

/// MTU the server offers.
pub const LOCAL_MTU: u16 = 247;

/// Largest config write accepted in one ATT write.
pub const CONFIG_WRITE_MAX: usize = LOCAL_MTU as usize - 3;

/// One config write, as received.
pub type ConfigWrite = heapless::Vec<u8, CONFIG_WRITE_MAX>;

/// Value bytes that fit one notification or write at `mtu`.
pub fn att_payload_limit(mtu: u16) -> usize {
    usize::from(mtu).saturating_sub(3)
}

// ───────────────────────────────────────────────────────────────
// Connection state (shared with the GATTS callback)
// ───────────────────────────────────────────────────────────────

/// Set by the GATTS callback on connect, cleared on disconnect.
static PEER_CONNECTED: AtomicBool = AtomicBool::new(false);

/// Whether a central is connected.  Safe from any task.
pub fn peer_connected() -> bool {
    PEER_CONNECTED.load(Ordering::Acquire)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Connected,
    Failed,
}

// ───────────────────────────────────────────────────────────────
// Payload
// ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct NotificationPayload<'a> {
    seq: u32,
    kind: &'a str,
    msg: &'a str,
}

/// Render the JSON notification body.
pub fn encode_payload(
    kind: NotificationKind,
    sequence: u32,
    text: &str,
) -> Result<Vec<u8>, CommsError> {
    let payload = NotificationPayload {
        seq: sequence,
        kind: kind.as_str(),
        msg: text,
    };
    let bytes = serde_json::to_vec(&payload).map_err(|_| CommsError::PayloadTooLarge)?;
    if bytes.len() > MAX_PAYLOAD_BYTES {
        return Err(CommsError::PayloadTooLarge);
    }
    Ok(bytes)
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF Bluedroid glue
// ───────────────────────────────────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures.  These atomics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::AtomicU32;

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_ALERT_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONFIG_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
/// Characteristic registration step (1 = dose alert, 2 = config).
#[cfg(target_os = "espidf")]
static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);
/// MTU agreed with the current client.
#[cfg(target_os = "espidf")]
static BLE_MTU: AtomicU32 = AtomicU32::new(DEFAULT_ATT_MTU as u32);

/// Config writes from the GATTS callback, drained by the main loop.
#[cfg(target_os = "espidf")]
static CONFIG_WRITES: embassy_sync::channel::Channel<
    embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex,
    ConfigWrite,
    2,
> = embassy_sync::channel::Channel::new();

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    unsafe {
        t.uuid.uuid128 = uuid.to_le_bytes();
    }
    t
}

#[cfg(target_os = "espidf")]
fn adv_params() -> esp_idf_svc::sys::esp_ble_adv_params_t {
    use esp_idf_svc::sys::*;
    esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        ..unsafe { core::mem::zeroed() }
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use crate::events::{Event, push_event};
    use esp_idf_svc::sys::*;

    BLE_GATTS_IF.store(gatts_if as u32, Ordering::Relaxed);

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid128_to_esp(SERVICE_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            };
            // service + 2 × (declaration + value) + CCCD
            unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, 6) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let svc_handle = unsafe { (*param).create.service_handle };
            BLE_SVC_HANDLE.store(svc_handle as u32, Ordering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            let mut char_uuid = uuid128_to_esp(CHAR_DOSE_ALERT);
            BLE_CHAR_STEP.store(1, Ordering::Relaxed);
            unsafe {
                esp_ble_gatts_start_service(svc_handle);
                esp_ble_gatts_add_char(
                    svc_handle,
                    &mut char_uuid,
                    ESP_GATT_PERM_READ as esp_gatt_perm_t,
                    (ESP_GATT_CHAR_PROP_BIT_READ | ESP_GATT_CHAR_PROP_BIT_NOTIFY)
                        as esp_gatt_char_prop_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let handle = unsafe { (*param).add_char.attr_handle };
            if BLE_CHAR_STEP.load(Ordering::Relaxed) == 2 {
                BLE_CONFIG_CHAR_HANDLE.store(handle as u32, Ordering::Relaxed);
                log::info!("BLE GATTS: config char (handle={})", handle);
                return;
            }
            BLE_ALERT_CHAR_HANDLE.store(handle as u32, Ordering::Relaxed);
            log::info!("BLE GATTS: dose alert char (handle={})", handle);

            let mut cccd: esp_bt_uuid_t = unsafe { core::mem::zeroed() };
            cccd.len = 2;
            cccd.uuid.uuid16 = ESP_GATT_UUID_CHAR_CLIENT_CONFIG as u16;
            let svc_handle = BLE_SVC_HANDLE.load(Ordering::Relaxed) as u16;
            unsafe {
                esp_ble_gatts_add_char_descr(
                    svc_handle,
                    &mut cccd,
                    (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            // CCCD is in place; the config characteristic comes next.
            BLE_CHAR_STEP.store(2, Ordering::Relaxed);
            let svc_handle = BLE_SVC_HANDLE.load(Ordering::Relaxed) as u16;
            let mut char_uuid = uuid128_to_esp(CHAR_CONFIG);
            unsafe {
                esp_ble_gatts_add_char(
                    svc_handle,
                    &mut char_uuid,
                    ESP_GATT_PERM_WRITE as esp_gatt_perm_t,
                    ESP_GATT_CHAR_PROP_BIT_WRITE as esp_gatt_char_prop_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_MTU_EVT => {
            let mtu = unsafe { (*param).mtu.mtu };
            BLE_MTU.store(u32::from(mtu), Ordering::Relaxed);
            log::info!("BLE GATTS: MTU {}", mtu);
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            // CCCD writes need an answer too; only config writes are kept.
            let status = if p.handle as u32 == BLE_CONFIG_CHAR_HANDLE.load(Ordering::Relaxed) {
                let data = unsafe { core::slice::from_raw_parts(p.value, p.len as usize) };
                match ConfigWrite::from_slice(data) {
                    // Long (prepared) writes are not reassembled.
                    Ok(_) if p.is_prep => esp_gatt_status_t_ESP_GATT_REQ_NOT_SUPPORTED,
                    Ok(write) => {
                        if CONFIG_WRITES.try_send(write).is_err() {
                            log::warn!("BLE GATTS: config write dropped, queue full");
                        }
                        esp_gatt_status_t_ESP_GATT_OK
                    }
                    Err(()) => esp_gatt_status_t_ESP_GATT_INVALID_ATTR_LEN,
                }
            } else {
                esp_gatt_status_t_ESP_GATT_OK
            };
            if p.need_rsp {
                unsafe {
                    esp_ble_gatts_send_response(
                        gatts_if,
                        p.conn_id,
                        p.trans_id,
                        status,
                        core::ptr::null_mut(),
                    )
                };
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let conn_id = unsafe { (*param).connect.conn_id };
            BLE_CONN_ID.store(conn_id as u32, Ordering::Relaxed);
            BLE_MTU.store(u32::from(DEFAULT_ATT_MTU), Ordering::Relaxed);
            PEER_CONNECTED.store(true, Ordering::Release);
            log::info!("BLE GATTS: client connected (conn_id={})", conn_id);
            push_event(Event::PeerConnected);
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            PEER_CONNECTED.store(false, Ordering::Release);
            BLE_MTU.store(u32::from(DEFAULT_ATT_MTU), Ordering::Relaxed);
            log::info!("BLE GATTS: client disconnected");
            push_event(Event::PeerDisconnected);
            // Restart advertising after disconnect.
            let mut params = adv_params();
            unsafe { esp_ble_gap_start_advertising(&mut params) };
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleAdapter {
    state: BleState,
    device_name: heapless::String<24>,
    /// Simulation: every payload "sent", in order.
    #[cfg(not(target_os = "espidf"))]
    sent: Vec<Vec<u8>>,
    /// Simulation: MTU agreed with the fake central.
    #[cfg(not(target_os = "espidf"))]
    sim_mtu: u16,
    /// Simulation: config writes not yet taken.
    #[cfg(not(target_os = "espidf"))]
    sim_config_writes: std::collections::VecDeque<ConfigWrite>,
}

impl BleAdapter {
    pub fn new(device_name: heapless::String<24>) -> Self {
        Self {
            state: BleState::Idle,
            device_name,
            #[cfg(not(target_os = "espidf"))]
            sent: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_mtu: DEFAULT_ATT_MTU,
            #[cfg(not(target_os = "espidf"))]
            sim_config_writes: std::collections::VecDeque::new(),
        }
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    /// Bring up the stack and start advertising.
    pub fn start(&mut self) -> Result<(), CommsError> {
        info!("BLE: starting advertising as '{}'", self.device_name);
        match self.platform_start() {
            Ok(()) => {
                self.state = BleState::Advertising;
                Ok(())
            }
            Err(e) => {
                self.state = BleState::Failed;
                Err(e)
            }
        }
    }

    /// Central connected (from the event queue).
    pub fn on_central_connected(&mut self) {
        info!("BLE: central connected");
        self.state = BleState::Connected;
        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_mtu = DEFAULT_ATT_MTU;
            PEER_CONNECTED.store(true, Ordering::Release);
        }
    }

    /// Central gone (from the event queue).  Advertising restarts in the
    /// GATTS callback.
    pub fn on_central_disconnected(&mut self) {
        info!("BLE: central disconnected");
        if self.state != BleState::Idle && self.state != BleState::Failed {
            self.state = BleState::Advertising;
        }
        #[cfg(not(target_os = "espidf"))]
        PEER_CONNECTED.store(false, Ordering::Release);
    }

    /// MTU in force for the current client.
    #[cfg(target_os = "espidf")]
    pub fn mtu(&self) -> u16 {
        BLE_MTU.load(Ordering::Relaxed) as u16
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn mtu(&self) -> u16 {
        self.sim_mtu
    }

    /// Next configuration write from the companion app, oldest first.
    #[cfg(target_os = "espidf")]
    pub fn take_config_write(&mut self) -> Option<ConfigWrite> {
        CONFIG_WRITES.try_receive().ok()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn take_config_write(&mut self) -> Option<ConfigWrite> {
        self.sim_config_writes.pop_front()
    }

    /// Simulation: payloads recorded so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Simulation: the central negotiates `mtu` (clamped to what the
    /// server offers).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_negotiate_mtu(&mut self, mtu: u16) {
        self.sim_mtu = mtu.clamp(DEFAULT_ATT_MTU, LOCAL_MTU);
    }

    /// Simulation: the central writes the config characteristic.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_write_config(&mut self, raw: &[u8]) -> Result<(), CommsError> {
        if raw.len() > att_payload_limit(self.sim_mtu) {
            return Err(CommsError::PayloadTooLarge);
        }
        let write = ConfigWrite::from_slice(raw).map_err(|_| CommsError::PayloadTooLarge)?;
        self.sim_config_writes.push_back(write);
        Ok(())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), CommsError> {
        use esp_idf_svc::sys::*;
        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();

            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                log::error!("BLE: bt_controller_init failed ({})", ret);
                return Err(CommsError::BleInitFailed);
            }
            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                log::error!("BLE: bt_controller_enable failed ({})", ret);
                return Err(CommsError::BleInitFailed);
            }
            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                log::error!("BLE: bluedroid_init failed ({})", ret);
                return Err(CommsError::BleInitFailed);
            }
            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                log::error!("BLE: bluedroid_enable failed ({})", ret);
                return Err(CommsError::BleInitFailed);
            }

            let ret = esp_ble_gatt_set_local_mtu(LOCAL_MTU);
            if ret != ESP_OK as i32 {
                log::warn!("BLE: set_local_mtu({}) failed ({})", LOCAL_MTU, ret);
            }

            esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));
            esp_ble_gatts_app_register(0);

            // Device name needs a NUL terminator for the C API.
            let mut name = [0u8; 25];
            let bytes = self.device_name.as_bytes();
            name[..bytes.len()].copy_from_slice(bytes);
            esp_ble_gap_set_device_name(name.as_ptr() as *const _);

            let mut params = adv_params();
            esp_ble_gap_start_advertising(&mut params);
        }
        info!(
            "BLE(espidf): Bluedroid stack initialized, advertising as '{}'",
            self.device_name
        );
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), CommsError> {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name, SERVICE_UUID
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(&mut self, payload: &[u8]) -> Result<(), CommsError> {
        use esp_idf_svc::sys::*;
        let handle = BLE_ALERT_CHAR_HANDLE.load(Ordering::Relaxed);
        if handle == 0 {
            return Err(CommsError::BleInitFailed);
        }
        let ret = unsafe {
            esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(Ordering::Relaxed) as esp_gatt_if_t,
                BLE_CONN_ID.load(Ordering::Relaxed) as u16,
                handle as u16,
                payload.len() as u16,
                payload.as_ptr() as *mut u8,
                false,
            )
        };
        if ret != ESP_OK as i32 {
            return Err(CommsError::PeerNotConnected);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(&mut self, payload: &[u8]) -> Result<(), CommsError> {
        info!("BLE(sim): notify {}", String::from_utf8_lossy(payload));
        self.sent.push(payload.to_vec());
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// NotificationPort implementation
// ───────────────────────────────────────────────────────────────

impl NotificationPort for BleAdapter {
    fn notify(
        &mut self,
        kind: NotificationKind,
        sequence: u32,
        text: &str,
    ) -> Result<(), CommsError> {
        if !self.is_peer_connected() {
            return Err(CommsError::PeerNotConnected);
        }
        let payload = encode_payload(kind, sequence, text).inspect_err(|_| {
            warn!("BLE: notification #{} does not fit", sequence);
        })?;
        let limit = att_payload_limit(self.mtu());
        if payload.len() > limit {
            warn!(
                "BLE: notification #{} is {} bytes, MTU {} allows {}",
                sequence,
                payload.len(),
                self.mtu(),
                limit
            );
            return Err(CommsError::PayloadTooLarge);
        }
        self.platform_notify(&payload)
    }

    fn is_peer_connected(&self) -> bool {
        peer_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_adapter() -> BleAdapter {
        let mut name = heapless::String::<24>::new();
        name.push_str("medalert-test").ok();
        BleAdapter::new(name)
    }

    #[test]
    fn payload_is_json() {
        let bytes = encode_payload(NotificationKind::Reminder, 3, "Take it (#3)").unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["seq"], 3);
        assert_eq!(v["kind"], "reminder");
        assert_eq!(v["msg"], "Take it (#3)");
    }

    #[test]
    fn payload_escapes_quotes() {
        let bytes = encode_payload(NotificationKind::Confirmed, 1, "say \"ok\"").unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["msg"], "say \"ok\"");
    }

    #[test]
    fn oversized_payload_is_refused() {
        let long = "x".repeat(MAX_PAYLOAD_BYTES);
        assert_eq!(
            encode_payload(NotificationKind::Reminder, 1, &long),
            Err(CommsError::PayloadTooLarge)
        );
    }

    // The connection flag is process-global, so the connected/disconnected
    // paths run in one test to stay independent of test ordering.
    #[test]
    fn notify_follows_connection_state() {
        let mut adapter = make_adapter();
        assert_eq!(adapter.state(), BleState::Idle);
        adapter.start().unwrap();
        assert_eq!(adapter.state(), BleState::Advertising);

        adapter.on_central_disconnected();
        assert_eq!(
            adapter.notify(NotificationKind::Reminder, 1, "hi"),
            Err(CommsError::PeerNotConnected)
        );
        assert!(adapter.sent().is_empty());

        adapter.on_central_connected();
        assert_eq!(adapter.state(), BleState::Connected);
        assert!(adapter.is_peer_connected());
        assert_eq!(adapter.mtu(), DEFAULT_ATT_MTU);

        // 20 bytes at the default MTU: refused, not cut short.
        assert_eq!(
            adapter.notify(NotificationKind::Reminder, 2, "hi again"),
            Err(CommsError::PayloadTooLarge)
        );
        assert!(adapter.sent().is_empty());

        adapter.sim_negotiate_mtu(185);
        adapter
            .notify(NotificationKind::Reminder, 3, "hi again")
            .unwrap();
        assert_eq!(adapter.sent().len(), 1);

        adapter.on_central_disconnected();
        assert_eq!(adapter.state(), BleState::Advertising);
        assert!(!adapter.is_peer_connected());
    }

    #[test]
    fn payload_limit_follows_mtu() {
        assert_eq!(att_payload_limit(DEFAULT_ATT_MTU), 20);
        assert_eq!(att_payload_limit(LOCAL_MTU), CONFIG_WRITE_MAX);
        assert_eq!(att_payload_limit(0), 0);
        let reminder = encode_payload(
            NotificationKind::Reminder,
            3,
            "Time to take your medication (#3)",
        )
        .unwrap();
        assert!(reminder.len() > att_payload_limit(DEFAULT_ATT_MTU));
        assert!(reminder.len() <= MAX_PAYLOAD_BYTES);
    }

    #[test]
    fn config_writes_are_taken_in_order() {
        let mut adapter = make_adapter();
        assert!(adapter.take_config_write().is_none());

        let first = br#"{"uplink_enabled":true}"#;
        assert_eq!(
            adapter.sim_write_config(first),
            Err(CommsError::PayloadTooLarge)
        );
        adapter.sim_negotiate_mtu(LOCAL_MTU);
        adapter.sim_write_config(first).unwrap();
        adapter.sim_write_config(br#"{"wifi_ssid":"ward-3"}"#).unwrap();

        assert_eq!(adapter.take_config_write().unwrap().as_slice(), first);
        assert_eq!(
            adapter.take_config_write().unwrap().as_slice(),
            br#"{"wifi_ssid":"ward-3"}"#
        );
        assert!(adapter.take_config_write().is_none());
    }
}

//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces a stable device ID in the form `MR-XXYYZZ` (last 3 bytes of the
//! 6-byte MAC in uppercase hex). This ID is:
//! - Deterministic across reboots (factory-burned eFuse MAC)
//! - Sent as `device_id` on every uplink record
//! - Mirrored in the BLE advertising name (`medalert-xxyyzz`)

use core::fmt::Write;

/// Fixed-size device ID string: "MR-XXYYZZ".
pub type DeviceIdString = heapless::String<16>;

/// BLE advertising name: "medalert-xxyyzz".
pub type HostnameString = heapless::String<24>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: mac is a valid 6-byte buffer.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x24, 0x6F, 0x28, 0x4D, 0x45, 0x44]
}

/// Format: `MR-XXYYZZ` (e.g., `MR-4D4544`).
pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    let _ = write!(id, "MR-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}

/// Format: `medalert-xxyyzz` (lowercase, 15 chars).
pub fn hostname(mac: &MacAddress) -> HostnameString {
    let mut name = HostnameString::new();
    let _ = write!(name, "medalert-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                  |
//! |-------------|--------------------|------------------------------|
//! | `ble`       | NotificationPort   | Bluedroid GATT server        |
//! | `hardware`  | IndicatorPort      | LEDs, LEDC buzzer            |
//! | `log_sink`  | EventSink          | Serial log output            |
//! | `nvs`       | ConfigPort         | NVS / in-memory store        |
//! |             | StoragePort        |                              |
//! |             | ConfirmationPort   |                              |
//! | `uplink`    | UplinkPort         | Uploader thread channel      |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA             |
//! | `time`      | -                  | ESP32 system timer / RTC     |
//! | `device_id` | -                  | Factory MAC (eFuse)          |
//! | `provisioning` | -               | BLE config writes → adapters |
//!
//! The environment sensor port is implemented directly by
//! [`DhtSensor`](crate::sensors::dht::DhtSensor).

pub mod ble;
pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod provisioning;
pub mod time;
pub mod uplink;
pub mod wifi;

//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements  | Connects to                          |
//! |------------|-------------|--------------------------------------|
//! | `hardware` | SensorPort  | ESP32 ADC / host simulation          |
//! |            | RenderPort  | LED strip / host simulation          |
//! | `log_sink` | EventSink   | Serial log output                    |
//! | `loopback` | BrokerPort  | In-memory broker (tests, demos)      |
//! | `mqtt`     | BrokerPort  | rumqttc session (host targets)       |
//! | `esp_mqtt` | BrokerPort  | ESP-IDF MQTT client (device targets) |
//! | `net`      | NetworkPort | ESP-IDF WiFi STA / host simulation   |
//! | `time`     | —           | Monotonic millisecond clock          |

pub mod hardware;
pub mod log_sink;
pub mod loopback;
pub mod net;
pub mod time;

#[cfg(not(target_os = "espidf"))]
pub mod mqtt;

#[cfg(target_os = "espidf")]
pub mod esp_mqtt;

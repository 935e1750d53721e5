//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements       | Connects to               |
//! |------------|------------------|---------------------------|
//! | `hardware` | ReadingSource    | ESP32 ADC (battery, NTC)  |
//! |            | LedDriver        | LEDC PWM (red, NIR)       |
//! |            | FeedbackSink     | LEDC buzzer, backlight    |
//! | `display`  | DisplaySink      | Serial log (TFT stand-in) |
//! | `log_sink` | EventSink        | Serial log output         |
//! | `nvs`      | PersistencePort  | NVS / in-memory store     |
//! | `time`     | -                | ESP32 system timer        |

pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;

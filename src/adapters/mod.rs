//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                   |
//! |------------|-----------------|-------------------------------|
//! | `hardware` | PinPort         | Raspberry Pi GPIO via rppal   |
//! | `sim`      | PinPort         | In-memory line state          |
//! | `sun`      | SunsetProvider  | NOAA sunrise equation         |
//! | `time`     | Clock, DelayNs  | Local wall clock, thread sleep|
//! | `log_sink` | EventSink       | `log` records                 |

#[cfg(feature = "rpi")]
pub mod hardware;
pub mod log_sink;
pub mod sim;
pub mod sun;
pub mod time;

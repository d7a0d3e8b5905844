#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod diag;
mod sensor;
pub mod uart;
mod wire;

pub use diag::{LogLevel, LogSink, LOG_LINE_LEN};
pub use sensor::{
    decode_frame, Config, ConnectionState, DisplaxTouch, FrameError, FrameSize, ListenerId,
    RegistryFullError, StateObserver, TouchContact, TouchListener, TouchReport, MAX_LISTENERS,
    MAX_TOUCHES,
};
pub use uart::crc::crc32;
pub use uart::{BufferFullError, Clock, Transport};

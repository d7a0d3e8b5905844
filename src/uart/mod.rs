//! Byte transport collaborators and the raw receive path.

pub(crate) mod crc;
pub(crate) mod frame_locator;
pub(crate) mod rx_buffer;

pub use self::rx_buffer::{BufferFullError, RX_BUFFER_SIZE};

/// Non-blocking byte stream connected to the sensor, typically a UART at 115200 baud.
///
/// The driver never waits on the transport: it only reads bytes that are already
/// [`available`](Transport::available).
pub trait Transport {
    /// Error returned by writes.
    type Error: core::fmt::Debug;

    /// Number of bytes that can be read right now without blocking.
    fn available(&mut self) -> usize;

    /// Reads one byte. Only called when [`available`](Transport::available) is non-zero.
    fn read_one(&mut self) -> u8;

    /// Queues `data` for transmission.
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Pushes queued data out.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn available(&mut self) -> usize {
        T::available(self)
    }

    fn read_one(&mut self) -> u8 {
        T::read_one(self)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        T::flush(self)
    }
}

/// Monotonic millisecond clock, used for the initialization timeout only.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed point.
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        C::now_ms(self)
    }
}

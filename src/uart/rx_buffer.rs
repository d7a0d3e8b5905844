use heapless::Vec;

/// Receive buffer capacity in bytes.
pub const RX_BUFFER_SIZE: usize = 2048;

/// The receive buffer is full, no more bytes can be appended.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferFullError;

/// Bounded FIFO of raw bytes read from the transport.
pub(crate) struct RxBuffer {
    buf: Vec<u8, RX_BUFFER_SIZE>,
}

impl RxBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_full(&self) -> bool {
        self.buf.is_full()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Appends as much of `data` as fits and returns how many bytes were taken.
    ///
    /// Fails only if the buffer was already full and `data` is not empty.
    pub fn append(&mut self, data: &[u8]) -> Result<usize, BufferFullError> {
        if data.is_empty() {
            return Ok(0);
        }
        if self.is_full() {
            return Err(BufferFullError);
        }
        let n = data.len().min(RX_BUFFER_SIZE - self.len());
        self.buf
            .extend_from_slice(&data[..n])
            .map_err(|_| BufferFullError)?;
        Ok(n)
    }

    /// Drops the first `n` bytes, keeping the rest in order.
    pub fn consume(&mut self, n: usize) {
        let len = self.buf.len();
        if n >= len {
            self.buf.clear();
            return;
        }
        self.buf.copy_within(n.., 0);
        self.buf.truncate(len - n);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

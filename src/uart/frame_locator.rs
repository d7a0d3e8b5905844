use super::rx_buffer::RxBuffer;
use crate::wire::{FRAME_LEN, FRAME_MARKER};

/// Offset of the first frame marker in `data`.
pub(crate) fn find_header(data: &[u8]) -> Option<usize> {
    if data.len() < FRAME_MARKER.len() {
        return None;
    }
    data.windows(FRAME_MARKER.len()).position(|w| w == FRAME_MARKER)
}

/// A whole frame is buffered and starts with the marker. The CRC is not checked here.
pub(crate) fn is_valid_frame_start(data: &[u8]) -> bool {
    data.len() >= FRAME_LEN && data.starts_with(&FRAME_MARKER)
}

/// Result of one [`resynchronize`] pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Resync {
    /// Too few bytes to scan; nothing was discarded.
    NeedMore,
    /// The buffer now starts at a frame marker.
    Aligned { discarded: usize },
    /// No marker anywhere, the whole buffer was dropped.
    NotFound { discarded: usize },
}

/// Realigns `rx` to the next frame marker.
pub(crate) fn resynchronize(rx: &mut RxBuffer) -> Resync {
    if rx.len() < FRAME_MARKER.len() {
        return Resync::NeedMore;
    }

    match find_header(rx.as_slice()) {
        Some(offset) => {
            rx.consume(offset);
            Resync::Aligned { discarded: offset }
        }
        None => {
            let discarded = rx.len();
            rx.clear();
            Resync::NotFound { discarded }
        }
    }
}

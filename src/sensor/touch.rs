use heapless::Vec;

use crate::uart::crc::crc32;
use crate::wire::{TouchFrame, CONTACT_SLOTS, FRAME_MARKER, PAYLOAD_LEN};

/// Maximum simultaneous contacts reported by the sensor.
pub const MAX_TOUCHES: usize = CONTACT_SLOTS;

/// Physical size of the touch frame in millimeters.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameSize {
    /// Width in mm
    pub width: u16,
    /// Height in mm
    pub height: u16,
}

impl Default for FrameSize {
    fn default() -> Self {
        Self {
            width: 1050,
            height: 650,
        }
    }
}

/// A single touch point.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchContact {
    /// Contact identifier assigned by the sensor, 0..=5.
    pub id: u8,
    /// X position in sensor units, 0 to the frame width.
    pub x: u16,
    /// Y position in sensor units, 0 to the frame height.
    pub y: u16,
    /// Contact width.
    pub width: u8,
    /// Contact height.
    pub height: u8,
    /// Contact pressure.
    pub pressure: u16,
    /// Frame size in effect when this contact was decoded, for normalizing `x`/`y`.
    pub frame_size: FrameSize,
    /// Always true for contacts returned by the driver.
    pub active: bool,
}

/// Contacts decoded from one touch frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TouchReport {
    contacts: Vec<TouchContact, MAX_TOUCHES>,
    scan_time: u16,
}

impl TouchReport {
    /// Active contacts in slot order.
    pub fn contacts(&self) -> &[TouchContact] {
        &self.contacts
    }

    /// Sensor scan time, in sensor clock units.
    pub fn scan_time(&self) -> u16 {
        self.scan_time
    }

    pub(crate) fn clear_contacts(&mut self) {
        self.contacts.clear();
    }
}

/// Why a touch frame was rejected.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Fewer than 72 bytes, or the frame marker is missing.
    Header,
    /// The header announces a payload size other than 64.
    PayloadSize(u16),
    /// The trailing CRC does not match the frame contents.
    Crc {
        /// CRC carried by the frame.
        stored: u32,
        /// CRC computed over header and payload.
        computed: u32,
    },
}

/// Decodes a complete touch frame at the start of `data`.
///
/// Contacts are stamped with `frame_size`. Only the first 72 bytes are looked at.
pub fn decode_frame(data: &[u8], frame_size: FrameSize) -> Result<TouchReport, FrameError> {
    let frame = TouchFrame::new(data).ok_or(FrameError::Header)?;
    if frame.marker()[..2] != FRAME_MARKER[..2] {
        return Err(FrameError::Header);
    }

    let size = frame.payload_size();
    if usize::from(size) != PAYLOAD_LEN {
        return Err(FrameError::PayloadSize(size));
    }

    let stored = frame.stored_crc();
    let computed = crc32(frame.checked_bytes());
    if stored != computed {
        return Err(FrameError::Crc { stored, computed });
    }

    // The count is not checked against the slots; anything above 6 just scans all of them.
    let slots = usize::from(frame.contact_count()).min(CONTACT_SLOTS);
    let mut contacts = Vec::new();
    for slot in (0..slots).filter_map(|i| frame.slot(i)) {
        if !slot.is_active() {
            continue;
        }
        // At most CONTACT_SLOTS pushes, can't overflow.
        let _ = contacts.push(TouchContact {
            id: slot.id(),
            x: slot.x(),
            y: slot.y(),
            width: slot.width(),
            height: slot.height(),
            pressure: slot.pressure(),
            frame_size,
            active: true,
        });
    }

    Ok(TouchReport {
        contacts,
        scan_time: frame.scan_time(),
    })
}

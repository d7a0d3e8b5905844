use num_enum::{FromPrimitive, IntoPrimitive};

/// Marker at the start of every touch frame: report id 0x0004 followed by payload size 64.
pub(crate) const FRAME_MARKER: [u8; 4] = [0x04, 0x00, 0x40, 0x00];

pub(crate) const HEADER_LEN: usize = 4;
pub(crate) const PAYLOAD_LEN: usize = 64;
pub(crate) const CRC_LEN: usize = 4;
/// Header + payload + CRC.
pub(crate) const FRAME_LEN: usize = HEADER_LEN + PAYLOAD_LEN + CRC_LEN;

/// Contact slots carried by one touch frame.
pub(crate) const CONTACT_SLOTS: usize = 6;
const SLOT_LEN: usize = 10;
const SLOTS_OFFSET: usize = 1;
const COUNT_OFFSET: usize = 61;
const SCAN_TIME_OFFSET: usize = 62;

const HID_DESCRIPTOR_LEN: usize = 32;
const HID_REPORT_DESCRIPTOR_LEN: usize = 708;
const FRAME_SIZE_LEN: usize = 6;
const ACK_LEN: usize = 2;

/// Command and report identifiers, sent little-endian over the wire.
///
/// Responses echo the command identifier, except reset which answers with
/// [`ResetResponse`](ReportId::ResetResponse).
#[derive(FromPrimitive, IntoPrimitive, Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub(crate) enum ReportId {
    Reset = 0x0000,
    GetHidDescriptor = 0x0001,
    GetHidReportDescription = 0x0002,
    GetFrameSize = 0x0003,
    TouchReport = 0x0004,
    EnableReporting = 0x0005,
    DisableReporting = 0x0006,
    ResetResponse = 0x226E,
    DisableUsbReporting = 0xFF00,
    EnableUsbReporting = 0xFF01,
    #[num_enum(catch_all)]
    Unknown(u16),
}

impl ReportId {
    /// Reads the identifier from the first two bytes of `data`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        match data {
            [lo, hi, ..] => Some(Self::from(u16::from_le_bytes([*lo, *hi]))),
            _ => None,
        }
    }

    /// Bytes that must be buffered before a report with this identifier can be handled.
    ///
    /// `None` for identifiers the sensor never sends.
    pub fn min_len(self) -> Option<usize> {
        match self {
            Self::GetHidDescriptor => Some(HID_DESCRIPTOR_LEN),
            Self::GetHidReportDescription => Some(HID_REPORT_DESCRIPTOR_LEN),
            Self::GetFrameSize => Some(FRAME_SIZE_LEN),
            Self::TouchReport => Some(FRAME_LEN),
            Self::EnableReporting
            | Self::DisableReporting
            | Self::ResetResponse
            | Self::DisableUsbReporting
            | Self::EnableUsbReporting => Some(ACK_LEN),
            Self::Reset | Self::Unknown(_) => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Reset => "RESET",
            Self::GetHidDescriptor => "GET_HID_DESCRIPTOR",
            Self::GetHidReportDescription => "GET_HID_REPORT_DESCRIPTION",
            Self::GetFrameSize => "GET_FRAME_SIZE",
            Self::TouchReport => "TOUCH_REPORT",
            Self::EnableReporting => "ENABLE_REPORTING",
            Self::DisableReporting => "DISABLE_REPORTING",
            Self::ResetResponse => "RESET_RESPONSE",
            Self::DisableUsbReporting => "DISABLE_USB_REPORTING",
            Self::EnableUsbReporting => "ENABLE_USB_REPORTING",
            Self::Unknown(_) => "UNKNOWN",
        }
    }

    pub fn to_le_bytes(self) -> [u8; 2] {
        u16::from(self).to_le_bytes()
    }
}

fn le16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

/// Frame size response: `id:u16 width:u16 height:u16`.
pub(crate) fn parse_frame_size(data: &[u8]) -> Option<(u16, u16)> {
    if data.len() < FRAME_SIZE_LEN {
        return None;
    }
    Some((le16(data, 2), le16(data, 4)))
}

/// Read-only view over one 72-byte touch frame.
#[derive(Clone, Copy)]
pub(crate) struct TouchFrame<'a> {
    buf: &'a [u8; FRAME_LEN],
}

impl<'a> TouchFrame<'a> {
    /// Views the first [`FRAME_LEN`] bytes of `data`, if there are that many.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        let buf: &'a [u8; FRAME_LEN] = data.get(..FRAME_LEN)?.try_into().ok()?;
        Some(Self { buf })
    }

    pub fn marker(&self) -> &'a [u8] {
        &self.buf[..HEADER_LEN]
    }

    pub fn payload_size(&self) -> u16 {
        le16(self.buf, 2)
    }

    /// The bytes covered by the trailing CRC.
    pub fn checked_bytes(&self) -> &'a [u8] {
        &self.buf[..HEADER_LEN + PAYLOAD_LEN]
    }

    pub fn stored_crc(&self) -> u32 {
        let o = HEADER_LEN + PAYLOAD_LEN;
        u32::from_le_bytes([self.buf[o], self.buf[o + 1], self.buf[o + 2], self.buf[o + 3]])
    }

    fn payload(&self) -> &'a [u8] {
        &self.buf[HEADER_LEN..HEADER_LEN + PAYLOAD_LEN]
    }

    pub fn contact_count(&self) -> u8 {
        self.payload()[COUNT_OFFSET]
    }

    pub fn scan_time(&self) -> u16 {
        le16(self.payload(), SCAN_TIME_OFFSET)
    }

    /// Contact slot `index`, `0..CONTACT_SLOTS`.
    pub fn slot(&self, index: usize) -> Option<ContactSlot<'a>> {
        if index >= CONTACT_SLOTS {
            return None;
        }
        let start = SLOTS_OFFSET + index * SLOT_LEN;
        Some(ContactSlot {
            buf: &self.payload()[start..start + SLOT_LEN],
        })
    }
}

/// One 10-byte contact slot inside a touch frame payload.
#[derive(Clone, Copy)]
pub(crate) struct ContactSlot<'a> {
    buf: &'a [u8],
}

impl<'a> ContactSlot<'a> {
    pub fn is_active(&self) -> bool {
        self.buf[0] != 0
    }

    pub fn id(&self) -> u8 {
        self.buf[1]
    }

    pub fn x(&self) -> u16 {
        le16(self.buf, 2)
    }

    pub fn y(&self) -> u16 {
        le16(self.buf, 4)
    }

    pub fn width(&self) -> u8 {
        self.buf[6]
    }

    pub fn height(&self) -> u8 {
        self.buf[7]
    }

    pub fn pressure(&self) -> u16 {
        le16(self.buf, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_id_roundtrips_known_values() {
        assert_eq!(ReportId::parse(&[0x6e, 0x22]), Some(ReportId::ResetResponse));
        assert_eq!(ReportId::parse(&[0x01, 0xff, 0x00]), Some(ReportId::EnableUsbReporting));
        assert_eq!(ReportId::parse(&[0x34, 0x12]), Some(ReportId::Unknown(0x1234)));
        assert_eq!(ReportId::parse(&[0x04]), None);
        assert_eq!(ReportId::DisableUsbReporting.to_le_bytes(), [0x00, 0xff]);
    }

    #[test]
    fn outbound_only_ids_have_no_min_len() {
        assert_eq!(ReportId::Reset.min_len(), None);
        assert_eq!(ReportId::Unknown(0xbeef).min_len(), None);
        assert_eq!(ReportId::TouchReport.min_len(), Some(FRAME_LEN));
        assert_eq!(ReportId::GetHidReportDescription.min_len(), Some(708));
    }

    #[test]
    fn frame_size_response_fields() {
        assert_eq!(parse_frame_size(&[0x03, 0x00, 0x1a, 0x04, 0x8a, 0x02]), Some((1050, 650)));
        assert_eq!(parse_frame_size(&[0x03, 0x00, 0x1a]), None);
    }

    #[test]
    fn touch_frame_field_offsets() {
        let mut raw = [0u8; FRAME_LEN];
        raw[..4].copy_from_slice(&FRAME_MARKER);
        // slot 1 starts at payload offset 11
        let slot = HEADER_LEN + 11;
        raw[slot..slot + 10].copy_from_slice(&[1, 5, 0x10, 0x00, 0x20, 0x00, 3, 4, 0x00, 0x01]);
        raw[HEADER_LEN + 61] = 2;
        raw[HEADER_LEN + 62..HEADER_LEN + 64].copy_from_slice(&[0x34, 0x12]);
        raw[68..72].copy_from_slice(&[0x78, 0x56, 0x34, 0x12]);

        let frame = TouchFrame::new(&raw).unwrap();
        assert_eq!(frame.marker(), &FRAME_MARKER);
        assert_eq!(frame.payload_size(), 64);
        assert_eq!(frame.contact_count(), 2);
        assert_eq!(frame.scan_time(), 0x1234);
        assert_eq!(frame.stored_crc(), 0x1234_5678);
        assert_eq!(frame.checked_bytes().len(), 68);

        assert!(!frame.slot(0).unwrap().is_active());
        let s = frame.slot(1).unwrap();
        assert!(s.is_active());
        assert_eq!((s.id(), s.x(), s.y()), (5, 0x10, 0x20));
        assert_eq!((s.width(), s.height(), s.pressure()), (3, 4, 0x100));
        assert!(frame.slot(CONTACT_SLOTS).is_none());
    }

    #[test]
    fn short_input_has_no_frame_view() {
        assert!(TouchFrame::new(&[0u8; FRAME_LEN - 1]).is_none());
    }
}

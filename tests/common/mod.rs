//! Scripted transport, manual clock and frame builders shared by the integration tests.

// Not every test file uses every helper.
#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use displax::{crc32, Clock, Config, ConnectionState, DisplaxTouch, Transport};

pub const FRAME_LEN: usize = 72;

pub const RESET: u16 = 0x0000;
pub const GET_FRAME_SIZE: u16 = 0x0003;
pub const ENABLE_REPORTING: u16 = 0x0005;
pub const RESET_RESPONSE: u16 = 0x226E;
pub const DISABLE_USB_REPORTING: u16 = 0xFF00;

/// In-memory transport: bytes fed by the test are read by the driver, writes are recorded.
#[derive(Default)]
pub struct MockTransport {
    incoming: VecDeque<u8>,
    sent: Vec<u8>,
    pub fail_writes: bool,
}

impl MockTransport {
    pub fn feed(&mut self, data: &[u8]) {
        self.incoming.extend(data);
    }

    pub fn pending(&self) -> usize {
        self.incoming.len()
    }

    /// Commands written since the last call, as little-endian ids.
    pub fn take_commands(&mut self) -> Vec<u16> {
        let cmds = self
            .sent
            .chunks(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        self.sent.clear();
        cmds
    }
}

impl Transport for MockTransport {
    type Error = &'static str;

    fn available(&mut self) -> usize {
        self.incoming.len()
    }

    fn read_one(&mut self) -> u8 {
        self.incoming.pop_front().expect("read_one called with nothing available")
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err("port closed");
        }
        self.sent.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

pub type Sensor<'a> = DisplaxTouch<'a, MockTransport, &'a ManualClock>;

pub fn sensor(clock: &ManualClock) -> Sensor<'_> {
    DisplaxTouch::new(MockTransport::default(), clock, Config::default())
}

pub fn ack(id: u16) -> [u8; 2] {
    id.to_le_bytes()
}

pub fn frame_size_response(width: u16, height: u16) -> Vec<u8> {
    let mut out = GET_FRAME_SIZE.to_le_bytes().to_vec();
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out
}

#[derive(Clone, Copy)]
pub struct Contact {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u8,
    pub height: u8,
    pub pressure: u16,
}

impl Contact {
    pub fn at(id: u8, x: u16, y: u16) -> Self {
        Self {
            id,
            x,
            y,
            width: 10,
            height: 12,
            pressure: 100,
        }
    }
}

/// A valid touch frame with `contacts` in the first slots.
pub fn touch_frame(contacts: &[Contact], scan_time: u16) -> Vec<u8> {
    let mut frame = vec![0u8; FRAME_LEN];
    frame[..4].copy_from_slice(&[0x04, 0x00, 0x40, 0x00]);
    let payload = &mut frame[4..68];
    payload[0] = 0x01;
    for (i, c) in contacts.iter().enumerate() {
        let slot = &mut payload[1 + i * 10..][..10];
        slot[0] = 0x01;
        slot[1] = c.id;
        slot[2..4].copy_from_slice(&c.x.to_le_bytes());
        slot[4..6].copy_from_slice(&c.y.to_le_bytes());
        slot[6] = c.width;
        slot[7] = c.height;
        slot[8..10].copy_from_slice(&c.pressure.to_le_bytes());
    }
    payload[61] = contacts.len() as u8;
    payload[62..64].copy_from_slice(&scan_time.to_le_bytes());

    let crc = crc32(&frame[..68]);
    frame[68..].copy_from_slice(&crc.to_le_bytes());
    frame
}

/// Runs the whole handshake, leaving the sensor synchronized with an 800 x 600 frame.
pub fn connect(sensor: &mut Sensor<'_>) {
    sensor.begin();
    for response in [
        ack(RESET_RESPONSE).to_vec(),
        frame_size_response(800, 600),
        ack(DISABLE_USB_REPORTING).to_vec(),
        ack(ENABLE_REPORTING).to_vec(),
    ] {
        sensor.transport_mut().feed(&response);
        sensor.poll();
    }
    assert_eq!(sensor.state(), ConnectionState::Synchronized);
    assert_eq!(sensor.buffered(), 0);
    sensor.transport_mut().take_commands();
}

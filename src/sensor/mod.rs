mod listeners;
mod state;
mod touch;

use crate::diag::{Diagnostics, LogSink};
use crate::uart::frame_locator::{is_valid_frame_start, resynchronize, Resync};
use crate::uart::rx_buffer::{BufferFullError, RxBuffer};
use crate::uart::{Clock, Transport};
use crate::wire::{self, ReportId, FRAME_LEN, PAYLOAD_LEN};

use self::listeners::ListenerRegistry;

pub use self::listeners::{ListenerId, RegistryFullError, TouchListener, MAX_LISTENERS};
pub use self::state::{ConnectionState, StateObserver};
pub use self::touch::{decode_frame, FrameError, FrameSize, TouchContact, TouchReport, MAX_TOUCHES};

const RX_CHUNK_LEN: usize = 64;

/// Driver configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// How long to wait for the reset response after [`begin`](DisplaxTouch::begin).
    pub init_timeout_ms: u64,
    /// Frame size assumed until the sensor reports its own.
    pub frame_size: FrameSize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            init_timeout_ms: 1000,
            frame_size: FrameSize::default(),
        }
    }
}

/// Displax touch sensor driver.
///
/// Owns the transport and clock, and borrows its observers for `'a`. Nothing happens
/// in the background: call [`begin()`](Self::begin) once, then [`poll()`](Self::poll)
/// repeatedly. All observers run synchronously inside those calls.
pub struct DisplaxTouch<'a, T, C> {
    transport: T,
    clock: C,
    config: Config,

    state: ConnectionState,
    init_started_ms: Option<u64>,
    rx: RxBuffer,

    report: TouchReport,
    frame_size: FrameSize,
    frame_size_pinned: bool,

    listeners: ListenerRegistry<'a>,
    state_observer: Option<&'a dyn StateObserver>,
    diag: Diagnostics<'a>,
}

impl<'a, T: Transport, C: Clock> DisplaxTouch<'a, T, C> {
    /// Create a new driver.
    ///
    /// The driver starts [`Disconnected`](ConnectionState::Disconnected); nothing is sent
    /// until [`begin()`](Self::begin).
    pub fn new(transport: T, clock: C, config: Config) -> Self {
        Self {
            transport,
            clock,
            config,
            state: ConnectionState::Disconnected,
            init_started_ms: None,
            rx: RxBuffer::new(),
            report: TouchReport::default(),
            frame_size: config.frame_size,
            frame_size_pinned: false,
            listeners: ListenerRegistry::new(),
            state_observer: None,
            diag: Diagnostics::new(),
        }
    }

    /// Reset the sensor and start the initialization handshake.
    ///
    /// Drops any bytes pending in the transport or the receive buffer, sends reset and
    /// enters [`Initializing`](ConnectionState::Initializing). Calling it again restarts
    /// the handshake and the timeout; it is the only way out of
    /// [`InitializationFailed`](ConnectionState::InitializationFailed).
    pub fn begin(&mut self) {
        self.diag.info(format_args!("Initializing"));

        self.init_started_ms = Some(self.clock.now_ms());
        self.discard_pending();
        self.rx.clear();

        self.set_state(ConnectionState::Initializing);
        self.send(ReportId::Reset);
    }

    /// Check the timeout, read what the transport has and handle one report.
    pub fn poll(&mut self) {
        self.check_timeout();

        if !self.state.is_link_up() {
            self.discard_pending();
            return;
        }

        if self.receive().is_err() {
            self.diag.warn(format_args!(
                "RX buffer overflow, resetting and searching for frame header"
            ));
            self.rx.clear();
            self.set_state(ConnectionState::Synchronizing);
            return;
        }

        if self.rx.len() < 2 {
            return;
        }

        match self.state {
            ConnectionState::Synchronizing => self.synchronize(),
            _ => self.dispatch(),
        }
    }

    /// Current link state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of active contacts in the last report.
    pub fn touch_count(&self) -> usize {
        self.report.contacts().len()
    }

    /// Active contact `index` of the last report.
    pub fn touch(&self, index: usize) -> Option<&TouchContact> {
        self.report.contacts().get(index)
    }

    /// All active contacts of the last report, in slot order.
    pub fn touches(&self) -> &[TouchContact] {
        self.report.contacts()
    }

    /// Scan time of the last report.
    pub fn scan_time(&self) -> u16 {
        self.report.scan_time()
    }

    /// Whether the last report had any active contact.
    pub fn is_touched(&self) -> bool {
        self.touch_count() > 0
    }

    /// Forget the current contacts. Listeners are not notified, and decoding of later
    /// reports is unaffected.
    pub fn clear_touches(&mut self) {
        self.report.clear_contacts();
    }

    /// Frame size used to stamp new contacts.
    pub fn frame_size(&self) -> FrameSize {
        self.frame_size
    }

    /// Override the frame size.
    ///
    /// Frame sizes reported by the sensor afterwards are ignored.
    pub fn set_frame_size(&mut self, width: u16, height: u16) {
        self.frame_size = FrameSize { width, height };
        self.frame_size_pinned = true;
        self.diag
            .info(format_args!("Frame size manually set to {} x {}", width, height));
    }

    /// Register a touch listener. Listeners are notified in registration order.
    pub fn add_touch_listener(
        &mut self,
        listener: &'a dyn TouchListener,
    ) -> Result<ListenerId, RegistryFullError> {
        self.listeners.add(listener)
    }

    /// Unregister a touch listener. Returns false if `id` is not registered.
    pub fn remove_touch_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Set or clear the state change observer.
    pub fn set_state_observer(&mut self, observer: Option<&'a dyn StateObserver>) {
        self.state_observer = observer;
    }

    /// Set or clear the diagnostics sink. Without a sink no lines are formatted.
    pub fn set_log_sink(&mut self, sink: Option<&'a dyn LogSink>) {
        self.diag.set_sink(sink);
    }

    /// Bytes waiting in the receive buffer.
    pub fn buffered(&self) -> usize {
        self.rx.len()
    }

    /// Ask for the HID descriptor. The answer is consumed and logged.
    pub fn request_hid_descriptor(&mut self) {
        self.send(ReportId::GetHidDescriptor);
    }

    /// Ask for the HID report descriptor. The answer is consumed and logged.
    pub fn request_hid_report_descriptor(&mut self) {
        self.send(ReportId::GetHidReportDescription);
    }

    /// Ask the sensor for its frame size.
    ///
    /// Like during the handshake, the answer is followed by the USB/UART reporting switch.
    pub fn request_frame_size(&mut self) {
        self.send(ReportId::GetFrameSize);
    }

    /// Turn touch reporting over the UART on or off.
    pub fn set_reporting(&mut self, enabled: bool) {
        self.send(if enabled {
            ReportId::EnableReporting
        } else {
            ReportId::DisableReporting
        });
    }

    /// Turn touch reporting over the sensor's USB port on or off.
    pub fn set_usb_reporting(&mut self, enabled: bool) {
        self.send(if enabled {
            ReportId::EnableUsbReporting
        } else {
            ReportId::DisableUsbReporting
        });
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport and clock.
    pub fn release(self) -> (T, C) {
        (self.transport, self.clock)
    }

    fn check_timeout(&mut self) {
        if self.state != ConnectionState::Initializing {
            return;
        }
        let Some(started) = self.init_started_ms else {
            return;
        };

        if self.clock.now_ms().saturating_sub(started) >= self.config.init_timeout_ms {
            self.diag.warn(format_args!(
                "Initialization timeout - no response from sensor in {} ms",
                self.config.init_timeout_ms
            ));
            self.init_started_ms = None;
            self.set_state(ConnectionState::InitializationFailed);
        }
    }

    fn discard_pending(&mut self) {
        while self.transport.available() > 0 {
            let _ = self.transport.read_one();
        }
    }

    fn receive(&mut self) -> Result<(), BufferFullError> {
        let before = self.rx.len();
        let mut chunk = [0u8; RX_CHUNK_LEN];
        loop {
            let n = self.transport.available().min(chunk.len());
            if n == 0 {
                break;
            }
            for byte in &mut chunk[..n] {
                *byte = self.transport.read_one();
            }

            // A second append on a full buffer reports the overflow.
            let mut data = &chunk[..n];
            while !data.is_empty() {
                let taken = self.rx.append(data)?;
                data = &data[taken..];
            }
        }
        trace!("rx: {} new bytes, {} buffered", self.rx.len() - before, self.rx.len());
        Ok(())
    }

    fn synchronize(&mut self) {
        match resynchronize(&mut self.rx) {
            Resync::NeedMore => {}
            Resync::Aligned { discarded: 0 } => {
                self.diag.info(format_args!("Synchronized at frame header"));
                self.set_state(ConnectionState::Synchronized);
            }
            Resync::Aligned { discarded } => {
                self.diag.info(format_args!(
                    "Synchronizing: discarded {} bytes before header",
                    discarded
                ));
                self.set_state(ConnectionState::Synchronized);
            }
            Resync::NotFound { discarded } => {
                self.diag.info(format_args!(
                    "No header found, discarded {} bytes",
                    discarded
                ));
            }
        }
    }

    fn dispatch(&mut self) {
        let Some(id) = ReportId::parse(self.rx.as_slice()) else {
            return;
        };
        let buffered = self.rx.len();

        let len = match id.min_len() {
            Some(min) if buffered >= min => min,
            // Known report, rest not here yet.
            Some(_) => return,
            None => {
                if buffered >= FRAME_LEN {
                    self.diag.warn(format_args!(
                        "Unknown report {:#06X}, searching for frame header",
                        u16::from(id)
                    ));
                    self.set_state(ConnectionState::Synchronizing);
                }
                return;
            }
        };

        debug!("rx report {:?}, {} bytes buffered", id, buffered);

        match id {
            ReportId::GetHidDescriptor => {
                self.diag
                    .info(format_args!("Received HID descriptor (length: {})", buffered));
                self.rx.consume(len);
            }
            ReportId::GetHidReportDescription => {
                self.diag.info(format_args!(
                    "Received HID report descriptor (length: {})",
                    buffered
                ));
                self.rx.consume(len);
            }
            ReportId::GetFrameSize => self.handle_frame_size(len),
            ReportId::TouchReport => self.handle_touch_report(),
            ReportId::EnableReporting => {
                self.diag.info(format_args!("Received enable reporting response"));
                self.rx.consume(len);
                self.set_state(ConnectionState::Synchronized);
            }
            ReportId::DisableReporting => {
                self.diag.info(format_args!("Received disable reporting response"));
                self.rx.consume(len);
            }
            ReportId::ResetResponse => self.handle_reset_response(len),
            ReportId::DisableUsbReporting => {
                self.diag
                    .info(format_args!("Received disable USB reporting response"));
                self.rx.consume(len);
                self.send(ReportId::EnableReporting);
            }
            ReportId::EnableUsbReporting => {
                self.diag
                    .info(format_args!("Received enable USB reporting response"));
                self.rx.consume(len);
            }
            ReportId::Reset | ReportId::Unknown(_) => {}
        }
    }

    fn handle_reset_response(&mut self, len: usize) {
        match self.init_started_ms.take() {
            Some(started) => self.diag.info(format_args!(
                "Received reset response (initialization time: {} ms)",
                self.clock.now_ms().saturating_sub(started)
            )),
            None => self.diag.info(format_args!("Received reset response")),
        }
        self.rx.consume(len);

        self.set_state(ConnectionState::Connected);
        self.send(ReportId::GetFrameSize);
    }

    fn handle_frame_size(&mut self, len: usize) {
        if let Some((width, height)) = wire::parse_frame_size(self.rx.as_slice()) {
            if self.frame_size_pinned {
                self.diag.info(format_args!(
                    "Received frame size (width: {}, height: {}), keeping manual {} x {}",
                    width, height, self.frame_size.width, self.frame_size.height
                ));
            } else {
                self.frame_size = FrameSize { width, height };
                self.diag.info(format_args!(
                    "Received frame size (width: {}, height: {})",
                    width, height
                ));
            }
        }
        self.rx.consume(len);

        self.send(ReportId::DisableUsbReporting);
    }

    fn handle_touch_report(&mut self) {
        let data = self.rx.as_slice();
        let decoded = if is_valid_frame_start(data) {
            decode_frame(data, self.frame_size)
        } else {
            Err(FrameError::Header)
        };

        match decoded {
            Ok(report) => {
                self.report = report;
                trace!(
                    "touch report: {} contacts, scan time {}",
                    self.report.contacts().len(),
                    self.report.scan_time()
                );
                self.listeners.notify(self.report.contacts());
                self.rx.consume(FRAME_LEN);
            }
            Err(err) => {
                match err {
                    FrameError::Header => self
                        .diag
                        .warn(format_args!("Invalid touch frame header, re-synchronizing")),
                    FrameError::PayloadSize(size) => self.diag.warn(format_args!(
                        "Unexpected touch report payload size: {}, expected: {}",
                        size, PAYLOAD_LEN
                    )),
                    FrameError::Crc { stored, computed } => self.diag.warn(format_args!(
                        "CRC mismatch (stored {:#010X}, computed {:#010X}), re-synchronizing",
                        stored, computed
                    )),
                }
                // Skip a single byte so the next marker can be found even inside this frame.
                self.rx.consume(1);
                self.set_state(ConnectionState::Synchronizing);
            }
        }
    }

    fn send(&mut self, command: ReportId) {
        let bytes = command.to_le_bytes();
        let result = self
            .transport
            .write(&bytes)
            .and_then(|()| self.transport.flush());

        match result {
            Ok(()) => self.diag.info(format_args!(
                "Sent command: {} ({:#06X})",
                command.name(),
                u16::from(command)
            )),
            Err(e) => self.diag.warn(format_args!(
                "Failed to send command {}: {:?}",
                command.name(),
                e
            )),
        }
    }

    fn set_state(&mut self, new: ConnectionState) {
        let previous = self.state;
        if new == previous {
            return;
        }
        self.state = new;

        self.diag.info(format_args!(
            "State changed from {} to {}",
            previous.name(),
            new.name()
        ));
        if let Some(observer) = self.state_observer {
            observer.on_state_change(new, previous);
        }
    }
}

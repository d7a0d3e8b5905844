/// Connection and synchronization state of the sensor link.
///
/// ```text
/// Disconnected -> Initializing -> Connected -> ... -> Synchronized
///                      |                                   ^
///                      v                                   |
///            InitializationFailed          Synchronizing --+
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// `begin()` has not been called.
    Disconnected,
    /// Reset sent, waiting for the sensor to answer.
    Initializing,
    /// The sensor answered the reset; the rest of the handshake is in flight.
    Connected,
    /// Looking for a frame marker after corrupt or unexpected data.
    Synchronizing,
    /// Touch reports are being decoded.
    Synchronized,
    /// No reset response within the timeout. Only `begin()` leaves this state.
    InitializationFailed,
}

impl ConnectionState {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Initializing => "INITIALIZING",
            Self::Connected => "CONNECTED",
            Self::Synchronizing => "SYNCHRONIZING",
            Self::Synchronized => "SYNCHRONIZED",
            Self::InitializationFailed => "INITIALIZATION_FAILED",
        }
    }

    /// States in which incoming bytes are interpreted.
    pub(crate) fn is_link_up(self) -> bool {
        !matches!(self, Self::Disconnected | Self::InitializationFailed)
    }
}

/// Notified on every state transition.
pub trait StateObserver {
    /// Called synchronously with the state just entered and the one just left.
    fn on_state_change(&self, new: ConnectionState, previous: ConnectionState);
}

impl<F: Fn(ConnectionState, ConnectionState)> StateObserver for F {
    fn on_state_change(&self, new: ConnectionState, previous: ConnectionState) {
        self(new, previous)
    }
}

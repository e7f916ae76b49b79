//! Single byte commands sent by the master unit

/// Payload sent back to the master once pairing has been accepted
pub const ACK: u8 = b'A';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Bind this unit to the master
    Pair,
    /// Obstacle detected
    HighAlert,
    /// Crowd detected
    CrowdAlert,
    /// Go to sleep immediately
    Sleep,
}

impl Command {
    /// Decode a received payload byte, `None` for anything unknown.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'P' => Some(Self::Pair),
            b'H' => Some(Self::HighAlert),
            b'C' => Some(Self::CrowdAlert),
            b'S' => Some(Self::Sleep),
            _ => None,
        }
    }
}

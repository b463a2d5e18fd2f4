//! WebSocket close codes
//!
//! Gateway-specific codes sent when the server closes a connection.

use serde::{Deserialize, Serialize};

/// Gateway WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    /// Unknown error occurred
    UnknownError = 4000,
    /// Frame could not be decoded (binary frames)
    DecodeError = 4002,
    /// The identity behind the token no longer exists
    AuthenticationFailed = 4004,
    /// No pong within the heartbeat timeout
    SessionTimeout = 4009,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            4000 => Some(Self::UnknownError),
            4002 => Some(Self::DecodeError),
            4004 => Some(Self::AuthenticationFailed),
            4009 => Some(Self::SessionTimeout),
            _ => None,
        }
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Check if the client should attempt to reconnect after this close code
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        matches!(
            self,
            Self::UnknownError | Self::DecodeError | Self::SessionTimeout
        )
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnknownError => "Unknown error occurred",
            Self::DecodeError => "Invalid payload encoding",
            Self::AuthenticationFailed => "Authentication failed",
            Self::SessionTimeout => "Session timeout",
        }
    }

    /// Get the name of this close code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnknownError => "UnknownError",
            Self::DecodeError => "DecodeError",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::SessionTimeout => "SessionTimeout",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.as_u16(), self.description())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}

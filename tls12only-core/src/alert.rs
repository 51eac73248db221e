//! TLS alert protocol (RFC 5246 Section 7.2).

use crate::error::{AlertDescription, Error, Result};

/// Alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlertLevel {
    /// Warning (1): connection may continue
    Warning = 1,

    /// Fatal (2): connection terminates immediately
    Fatal = 2,
}

impl AlertLevel {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AlertLevel::Warning),
            2 => Some(AlertLevel::Fatal),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// TLS alert message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    /// Alert level
    pub level: AlertLevel,

    /// Alert description
    pub description: AlertDescription,
}

impl Alert {
    /// Create a new alert.
    pub fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Self { level, description }
    }

    /// Create a fatal alert.
    pub fn fatal(description: AlertDescription) -> Self {
        Self::new(AlertLevel::Fatal, description)
    }

    /// Create a warning alert.
    pub fn warning(description: AlertDescription) -> Self {
        Self::new(AlertLevel::Warning, description)
    }

    /// Create a close_notify alert.
    pub fn close_notify() -> Self {
        Self::warning(AlertDescription::CloseNotify)
    }

    /// The alert used to report `description`, at the level TLS 1.2 prescribes.
    pub fn for_description(description: AlertDescription) -> Self {
        if description.is_warning_only() {
            Self::warning(description)
        } else {
            Self::fatal(description)
        }
    }

    /// Encode the alert to bytes.
    pub fn encode(&self) -> [u8; 2] {
        [self.level.to_u8(), self.description.to_u8()]
    }

    /// Decode an alert from bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != 2 {
            return Err(Error::InvalidMessage(format!(
                "Alert must be 2 bytes, got {}",
                data.len()
            )));
        }

        let level = AlertLevel::from_u8(data[0])
            .ok_or_else(|| Error::InvalidMessage("Invalid alert level".into()))?;

        Ok(Self {
            level,
            description: AlertDescription::from_u8(data[1]),
        })
    }

    /// Decode every alert in an alert record's content.
    ///
    /// A record may carry several alerts back to back, but never a partial
    /// one.
    pub fn decode_all(data: &[u8]) -> Result<Vec<Self>> {
        if data.is_empty() || data.len() % 2 != 0 {
            return Err(Error::InvalidMessage(format!(
                "Alert record of {} bytes",
                data.len()
            )));
        }
        data.chunks_exact(2).map(Self::decode).collect()
    }

    /// Check if this alert is fatal.
    pub fn is_fatal(&self) -> bool {
        self.level == AlertLevel::Fatal
    }

    /// Check if this alert closes the connection cleanly.
    pub fn is_close_notify(&self) -> bool {
        self.description == AlertDescription::CloseNotify
    }
}

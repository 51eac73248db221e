//! Error types for the protocol engine.

use thiserror::Error;

/// Result type for protocol engine operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while configuring or running a TLS 1.2 connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Protocol error; the matching fatal alert is sent to the peer
    #[error("Protocol error: {0}")]
    ProtocolError(ProtocolError),

    /// Cryptographic error
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Handshake failure
    #[error("Handshake failure: {0}")]
    HandshakeFailure(String),

    /// Fatal alert received from peer
    #[error("Alert received: {0:?}")]
    AlertReceived(AlertDescription),

    /// Unexpected message
    #[error("Unexpected message: {0}")]
    UnexpectedMessage(String),

    /// Invalid message format
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Record failed authentication
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Certificate verification failed
    #[error("Certificate verification failed: {0}")]
    CertificateVerificationFailed(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// The connection was closed (close_notify or transport EOF)
    #[error("Connection closed")]
    ConnectionClosed,
}

impl Error {
    /// The alert to send to the peer when this error aborts a connection.
    ///
    /// `None` means the connection should be torn down without an alert
    /// (the peer already closed it, or the transport failed).
    pub fn alert_description(&self) -> Option<AlertDescription> {
        match self {
            Error::ProtocolError(e) => Some(e.alert_description()),
            Error::UnexpectedMessage(_) => Some(AlertDescription::UnexpectedMessage),
            Error::InvalidMessage(_) => Some(AlertDescription::DecodeError),
            Error::DecryptionFailed => Some(AlertDescription::BadRecordMac),
            Error::HandshakeFailure(_) => Some(AlertDescription::HandshakeFailure),
            Error::CertificateVerificationFailed(_) => Some(AlertDescription::BadCertificate),
            Error::UnsupportedFeature(_) => Some(AlertDescription::HandshakeFailure),
            Error::CryptoError(_) | Error::InternalError(_) | Error::InvalidConfig(_) => {
                Some(AlertDescription::InternalError)
            },
            Error::AlertReceived(_) | Error::IoError(_) | Error::ConnectionClosed => None,
        }
    }

    /// True when this error means the peer negotiated (or demanded) a
    /// protocol version this build does not enable.
    pub fn is_version_mismatch(&self) -> bool {
        matches!(
            self,
            Error::ProtocolError(ProtocolError::ProtocolVersion)
                | Error::AlertReceived(AlertDescription::ProtocolVersion)
        )
    }
}

impl From<tls12only_crypto::Error> for Error {
    fn from(err: tls12only_crypto::Error) -> Self {
        match err {
            tls12only_crypto::Error::AuthenticationFailed => Error::DecryptionFailed,
            tls12only_crypto::Error::SignatureVerificationFailed
            | tls12only_crypto::Error::InvalidSignature => {
                Error::ProtocolError(ProtocolError::DecryptError)
            },
            tls12only_crypto::Error::InvalidPublicKey
            | tls12only_crypto::Error::KeyExchangeFailed => {
                Error::ProtocolError(ProtocolError::IllegalParameter)
            },
            other => Error::CryptoError(other.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::ConnectionClosed,
            _ => Error::IoError(err.to_string()),
        }
    }
}

/// Protocol-level errors, one per fatal alert the engine raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Message could not be decoded
    #[error("decode_error")]
    DecodeError,

    /// Record exceeds the maximum length
    #[error("record_overflow")]
    RecordOverflow,

    /// No acceptable parameters
    #[error("handshake_failure")]
    HandshakeFailure,

    /// Certificate could not be used
    #[error("bad_certificate")]
    BadCertificate,

    /// Certificate type not supported
    #[error("unsupported_certificate")]
    UnsupportedCertificate,

    /// Field out of range or inconsistent
    #[error("illegal_parameter")]
    IllegalParameter,

    /// Signature or Finished check failed
    #[error("decrypt_error")]
    DecryptError,

    /// Peer's protocol version is not enabled
    #[error("protocol_version")]
    ProtocolVersion,

    /// Peer sent an extension it must not send
    #[error("unsupported_extension")]
    UnsupportedExtension,

    /// No ALPN protocol in common
    #[error("no_application_protocol")]
    NoApplicationProtocol,
}

impl ProtocolError {
    /// The alert that reports this error to the peer.
    pub const fn alert_description(self) -> AlertDescription {
        match self {
            ProtocolError::DecodeError => AlertDescription::DecodeError,
            ProtocolError::RecordOverflow => AlertDescription::RecordOverflow,
            ProtocolError::HandshakeFailure => AlertDescription::HandshakeFailure,
            ProtocolError::BadCertificate => AlertDescription::BadCertificate,
            ProtocolError::UnsupportedCertificate => AlertDescription::UnsupportedCertificate,
            ProtocolError::IllegalParameter => AlertDescription::IllegalParameter,
            ProtocolError::DecryptError => AlertDescription::DecryptError,
            ProtocolError::ProtocolVersion => AlertDescription::ProtocolVersion,
            ProtocolError::UnsupportedExtension => AlertDescription::UnsupportedExtension,
            ProtocolError::NoApplicationProtocol => AlertDescription::NoApplicationProtocol,
        }
    }
}

/// TLS alert descriptions (RFC 5246 Section 7.2 plus later registrations).
///
/// Codes outside the registry are kept as [`AlertDescription::Unknown`] so a
/// peer's fatal alert is always reported, whatever its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertDescription {
    /// Close notify
    CloseNotify,

    /// Unexpected message
    UnexpectedMessage,

    /// Bad record MAC
    BadRecordMac,

    /// Decryption failed (reserved, TLS 1.0 only)
    DecryptionFailed,

    /// Record overflow
    RecordOverflow,

    /// Decompression failure
    DecompressionFailure,

    /// Handshake failure
    HandshakeFailure,

    /// No certificate (reserved, SSL 3.0 only)
    NoCertificate,

    /// Bad certificate
    BadCertificate,

    /// Unsupported certificate
    UnsupportedCertificate,

    /// Certificate revoked
    CertificateRevoked,

    /// Certificate expired
    CertificateExpired,

    /// Certificate unknown
    CertificateUnknown,

    /// Illegal parameter
    IllegalParameter,

    /// Unknown CA
    UnknownCa,

    /// Access denied
    AccessDenied,

    /// Decode error
    DecodeError,

    /// Decrypt error
    DecryptError,

    /// Export restriction (reserved)
    ExportRestriction,

    /// Protocol version
    ProtocolVersion,

    /// Insufficient security
    InsufficientSecurity,

    /// Internal error
    InternalError,

    /// Inappropriate fallback
    InappropriateFallback,

    /// User canceled
    UserCanceled,

    /// No renegotiation (warning)
    NoRenegotiation,

    /// Missing extension
    MissingExtension,

    /// Unsupported extension
    UnsupportedExtension,

    /// Certificate unobtainable
    CertificateUnobtainable,

    /// Unrecognized name
    UnrecognizedName,

    /// Bad certificate status response
    BadCertificateStatusResponse,

    /// Bad certificate hash value
    BadCertificateHashValue,

    /// Unknown PSK identity
    UnknownPskIdentity,

    /// Certificate required (sent by TLS 1.3 peers)
    CertificateRequired,

    /// No application protocol
    NoApplicationProtocol,

    /// Unassigned or unrecognised code
    Unknown(u8),
}

impl AlertDescription {
    /// Convert from wire format (u8).
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => AlertDescription::CloseNotify,
            10 => AlertDescription::UnexpectedMessage,
            20 => AlertDescription::BadRecordMac,
            21 => AlertDescription::DecryptionFailed,
            22 => AlertDescription::RecordOverflow,
            30 => AlertDescription::DecompressionFailure,
            40 => AlertDescription::HandshakeFailure,
            41 => AlertDescription::NoCertificate,
            42 => AlertDescription::BadCertificate,
            43 => AlertDescription::UnsupportedCertificate,
            44 => AlertDescription::CertificateRevoked,
            45 => AlertDescription::CertificateExpired,
            46 => AlertDescription::CertificateUnknown,
            47 => AlertDescription::IllegalParameter,
            48 => AlertDescription::UnknownCa,
            49 => AlertDescription::AccessDenied,
            50 => AlertDescription::DecodeError,
            51 => AlertDescription::DecryptError,
            60 => AlertDescription::ExportRestriction,
            70 => AlertDescription::ProtocolVersion,
            71 => AlertDescription::InsufficientSecurity,
            80 => AlertDescription::InternalError,
            86 => AlertDescription::InappropriateFallback,
            90 => AlertDescription::UserCanceled,
            100 => AlertDescription::NoRenegotiation,
            109 => AlertDescription::MissingExtension,
            110 => AlertDescription::UnsupportedExtension,
            111 => AlertDescription::CertificateUnobtainable,
            112 => AlertDescription::UnrecognizedName,
            113 => AlertDescription::BadCertificateStatusResponse,
            114 => AlertDescription::BadCertificateHashValue,
            115 => AlertDescription::UnknownPskIdentity,
            116 => AlertDescription::CertificateRequired,
            120 => AlertDescription::NoApplicationProtocol,
            other => AlertDescription::Unknown(other),
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        match self {
            AlertDescription::CloseNotify => 0,
            AlertDescription::UnexpectedMessage => 10,
            AlertDescription::BadRecordMac => 20,
            AlertDescription::DecryptionFailed => 21,
            AlertDescription::RecordOverflow => 22,
            AlertDescription::DecompressionFailure => 30,
            AlertDescription::HandshakeFailure => 40,
            AlertDescription::NoCertificate => 41,
            AlertDescription::BadCertificate => 42,
            AlertDescription::UnsupportedCertificate => 43,
            AlertDescription::CertificateRevoked => 44,
            AlertDescription::CertificateExpired => 45,
            AlertDescription::CertificateUnknown => 46,
            AlertDescription::IllegalParameter => 47,
            AlertDescription::UnknownCa => 48,
            AlertDescription::AccessDenied => 49,
            AlertDescription::DecodeError => 50,
            AlertDescription::DecryptError => 51,
            AlertDescription::ExportRestriction => 60,
            AlertDescription::ProtocolVersion => 70,
            AlertDescription::InsufficientSecurity => 71,
            AlertDescription::InternalError => 80,
            AlertDescription::InappropriateFallback => 86,
            AlertDescription::UserCanceled => 90,
            AlertDescription::NoRenegotiation => 100,
            AlertDescription::MissingExtension => 109,
            AlertDescription::UnsupportedExtension => 110,
            AlertDescription::CertificateUnobtainable => 111,
            AlertDescription::UnrecognizedName => 112,
            AlertDescription::BadCertificateStatusResponse => 113,
            AlertDescription::BadCertificateHashValue => 114,
            AlertDescription::UnknownPskIdentity => 115,
            AlertDescription::CertificateRequired => 116,
            AlertDescription::NoApplicationProtocol => 120,
            AlertDescription::Unknown(value) => value,
        }
    }

    /// Whether this description is only ever sent at warning level in TLS 1.2.
    pub const fn is_warning_only(self) -> bool {
        matches!(
            self,
            AlertDescription::CloseNotify
                | AlertDescription::UserCanceled
                | AlertDescription::NoRenegotiation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_description_conversion() {
        assert_eq!(AlertDescription::from_u8(0), AlertDescription::CloseNotify);
        assert_eq!(AlertDescription::from_u8(70), AlertDescription::ProtocolVersion);
        assert_eq!(AlertDescription::from_u8(30), AlertDescription::DecompressionFailure);
        assert_eq!(AlertDescription::from_u8(116), AlertDescription::CertificateRequired);
        assert_eq!(AlertDescription::from_u8(255), AlertDescription::Unknown(255));

        assert_eq!(AlertDescription::ProtocolVersion.to_u8(), 70);
        assert_eq!(AlertDescription::NoRenegotiation.to_u8(), 100);
        assert_eq!(AlertDescription::Unknown(200).to_u8(), 200);
    }

    #[test]
    fn test_every_code_maps_back_to_itself() {
        for value in 0..=u8::MAX {
            assert_eq!(AlertDescription::from_u8(value).to_u8(), value);
        }
    }

    #[test]
    fn test_warning_only_alerts() {
        assert!(AlertDescription::CloseNotify.is_warning_only());
        assert!(AlertDescription::NoRenegotiation.is_warning_only());
        assert!(!AlertDescription::ProtocolVersion.is_warning_only());
    }

    #[test]
    fn test_error_to_alert_mapping() {
        let err = Error::ProtocolError(ProtocolError::ProtocolVersion);
        assert_eq!(
            err.alert_description(),
            Some(AlertDescription::ProtocolVersion)
        );
        assert!(err.is_version_mismatch());

        assert_eq!(
            Error::DecryptionFailed.alert_description(),
            Some(AlertDescription::BadRecordMac)
        );
        assert_eq!(
            Error::AlertReceived(AlertDescription::HandshakeFailure).alert_description(),
            None
        );
    }

    #[test]
    fn test_crypto_error_conversion() {
        let err: Error = tls12only_crypto::Error::AuthenticationFailed.into();
        assert_eq!(err, Error::DecryptionFailed);

        let err: Error = tls12only_crypto::Error::SignatureVerificationFailed.into();
        assert_eq!(err, Error::ProtocolError(ProtocolError::DecryptError));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::ProtocolError(ProtocolError::ProtocolVersion).to_string(),
            "Protocol error: protocol_version"
        );
        assert_eq!(
            Error::AlertReceived(AlertDescription::ProtocolVersion).to_string(),
            "Alert received: ProtocolVersion"
        );
    }
}

//! TLS protocol constants and types.

/// TLS protocol version.
///
/// Every version up to TLS 1.3 has a variant so a peer's offer can be
/// recognised and answered; only the versions in
/// [`ENABLED_PROTOCOL_VERSIONS`] can ever be negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ProtocolVersion {
    /// TLS 1.0 (RFC 2246) - Legacy, never enabled
    Tls10 = 0x0301,

    /// TLS 1.1 (RFC 4346) - Legacy, never enabled
    Tls11 = 0x0302,

    /// TLS 1.2 (RFC 5246)
    Tls12 = 0x0303,

    /// TLS 1.3 (RFC 8446) - disabled in this build
    Tls13 = 0x0304,
}

/// Protocol versions compiled into this engine.
///
/// TLS 1.3 is deliberately absent: configurations naming it are rejected and
/// peers selecting it are refused with a `protocol_version` alert.
pub const ENABLED_PROTOCOL_VERSIONS: &[ProtocolVersion] = &[ProtocolVersion::Tls12];

impl ProtocolVersion {
    /// Create from wire format (u16 big-endian).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0301 => Some(ProtocolVersion::Tls10),
            0x0302 => Some(ProtocolVersion::Tls11),
            0x0303 => Some(ProtocolVersion::Tls12),
            0x0304 => Some(ProtocolVersion::Tls13),
            _ => None,
        }
    }

    /// Convert to wire format (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Get the protocol name.
    pub const fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Tls10 => "TLS 1.0",
            ProtocolVersion::Tls11 => "TLS 1.1",
            ProtocolVersion::Tls12 => "TLS 1.2",
            ProtocolVersion::Tls13 => "TLS 1.3",
        }
    }

    /// Whether this version is compiled into the engine.
    pub const fn is_enabled(self) -> bool {
        let mut i = 0;
        while i < ENABLED_PROTOCOL_VERSIONS.len() {
            if ENABLED_PROTOCOL_VERSIONS[i] as u16 == self as u16 {
                return true;
            }
            i += 1;
        }
        false
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// TLS content types (RFC 5246 Section 6.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContentType {
    /// Change cipher spec
    ChangeCipherSpec = 20,

    /// Alert
    Alert = 21,

    /// Handshake
    Handshake = 22,

    /// Application data
    ApplicationData = 23,
}

impl ContentType {
    /// Create from wire format.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            20 => Some(ContentType::ChangeCipherSpec),
            21 => Some(ContentType::Alert),
            22 => Some(ContentType::Handshake),
            23 => Some(ContentType::ApplicationData),
            _ => None,
        }
    }

    /// Convert to wire format.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Handshake message types used by TLS 1.2 (RFC 5246 Section 7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandshakeType {
    /// HelloRequest (renegotiation trigger, refused)
    HelloRequest = 0,

    /// ClientHello
    ClientHello = 1,

    /// ServerHello
    ServerHello = 2,

    /// NewSessionTicket
    NewSessionTicket = 4,

    /// Certificate
    Certificate = 11,

    /// ServerKeyExchange
    ServerKeyExchange = 12,

    /// CertificateRequest
    CertificateRequest = 13,

    /// ServerHelloDone
    ServerHelloDone = 14,

    /// CertificateVerify
    CertificateVerify = 15,

    /// ClientKeyExchange
    ClientKeyExchange = 16,

    /// Finished
    Finished = 20,
}

impl HandshakeType {
    /// Create from wire format.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(HandshakeType::HelloRequest),
            1 => Some(HandshakeType::ClientHello),
            2 => Some(HandshakeType::ServerHello),
            4 => Some(HandshakeType::NewSessionTicket),
            11 => Some(HandshakeType::Certificate),
            12 => Some(HandshakeType::ServerKeyExchange),
            13 => Some(HandshakeType::CertificateRequest),
            14 => Some(HandshakeType::ServerHelloDone),
            15 => Some(HandshakeType::CertificateVerify),
            16 => Some(HandshakeType::ClientKeyExchange),
            20 => Some(HandshakeType::Finished),
            _ => None,
        }
    }

    /// Convert to wire format.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// TLS extension types.
///
/// Codepoints this engine does not act on decode as `Unknown` and are
/// carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionType {
    /// Server Name Indication (RFC 6066)
    ServerName,

    /// Supported groups, formerly elliptic_curves (RFC 8422)
    SupportedGroups,

    /// EC point formats (RFC 8422)
    EcPointFormats,

    /// Signature algorithms (RFC 5246)
    SignatureAlgorithms,

    /// Application-Layer Protocol Negotiation (RFC 7301)
    ApplicationLayerProtocolNegotiation,

    /// Extended master secret (RFC 7627)
    ExtendedMasterSecret,

    /// Session ticket (RFC 5077), recognised but never negotiated
    SessionTicket,

    /// Supported versions (RFC 8446); only ever present in TLS 1.3 offers
    SupportedVersions,

    /// Key share (RFC 8446); only ever present in TLS 1.3 offers
    KeyShare,

    /// Renegotiation indication (RFC 5746)
    RenegotiationInfo,

    /// Anything else
    Unknown(u16),
}

impl ExtensionType {
    /// Create from wire format.
    pub const fn from_u16(value: u16) -> Self {
        match value {
            0 => ExtensionType::ServerName,
            10 => ExtensionType::SupportedGroups,
            11 => ExtensionType::EcPointFormats,
            13 => ExtensionType::SignatureAlgorithms,
            16 => ExtensionType::ApplicationLayerProtocolNegotiation,
            23 => ExtensionType::ExtendedMasterSecret,
            35 => ExtensionType::SessionTicket,
            43 => ExtensionType::SupportedVersions,
            51 => ExtensionType::KeyShare,
            0xFF01 => ExtensionType::RenegotiationInfo,
            other => ExtensionType::Unknown(other),
        }
    }

    /// Convert to wire format.
    pub const fn to_u16(self) -> u16 {
        match self {
            ExtensionType::ServerName => 0,
            ExtensionType::SupportedGroups => 10,
            ExtensionType::EcPointFormats => 11,
            ExtensionType::SignatureAlgorithms => 13,
            ExtensionType::ApplicationLayerProtocolNegotiation => 16,
            ExtensionType::ExtendedMasterSecret => 23,
            ExtensionType::SessionTicket => 35,
            ExtensionType::SupportedVersions => 43,
            ExtensionType::KeyShare => 51,
            ExtensionType::RenegotiationInfo => 0xFF01,
            ExtensionType::Unknown(value) => value,
        }
    }
}

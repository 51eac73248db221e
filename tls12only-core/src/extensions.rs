//! Hello extensions.
//!
//! Builders and parsers for the extensions a TLS 1.2 ECDHE handshake uses:
//!
//! - `server_name` (RFC 6066)
//! - `supported_groups` and `ec_point_formats` (RFC 8422)
//! - `signature_algorithms` (RFC 5246 Section 7.4.1.4.1)
//! - `application_layer_protocol_negotiation` (RFC 7301)
//! - `extended_master_secret` (RFC 7627)
//! - `renegotiation_info` (RFC 5746)
//!
//! `supported_versions` (RFC 8446) is parsed only to recognise TLS 1.3 peers.

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::ExtensionType;
use bytes::{Buf, BufMut, BytesMut};
use std::collections::HashSet;
use tls12only_crypto::{KeyExchangeAlgorithm, SignatureAlgorithm};

/// EC point format `uncompressed` (RFC 8422 Section 5.1.2).
pub const EC_POINT_FORMAT_UNCOMPRESSED: u8 = 0;

/// TLS extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Extension type
    pub extension_type: ExtensionType,

    /// Extension data
    pub data: Vec<u8>,
}

impl Extension {
    /// Create a new extension.
    pub fn new(extension_type: ExtensionType, data: Vec<u8>) -> Self {
        Self {
            extension_type,
            data,
        }
    }

    /// Encode the extension to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(4 + self.data.len());
        buf.put_u16(self.extension_type.to_u16());
        buf.put_u16(self.data.len() as u16);
        buf.put_slice(&self.data);
        buf.to_vec()
    }

    /// Decode an extension from the front of `data`.
    ///
    /// Returns the extension and the number of bytes consumed.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < 4 {
            return Err(Error::InvalidMessage("Extension too short".into()));
        }

        let mut header = &data[..4];
        let extension_type = ExtensionType::from_u16(header.get_u16());
        let length = header.get_u16() as usize;

        if data.len() < 4 + length {
            return Err(Error::InvalidMessage("Incomplete extension data".into()));
        }

        Ok((
            Self::new(extension_type, data[4..4 + length].to_vec()),
            4 + length,
        ))
    }
}

/// Extension list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    extensions: Vec<Extension>,
}

impl Extensions {
    /// Create a new empty extension list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension.
    pub fn add(&mut self, extension: Extension) {
        self.extensions.push(extension);
    }

    /// Get an extension by type.
    pub fn get(&self, ext_type: ExtensionType) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.extension_type == ext_type)
    }

    /// Check if an extension is present.
    pub fn has(&self, ext_type: ExtensionType) -> bool {
        self.get(ext_type).is_some()
    }

    /// Iterate over the extensions in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.iter()
    }

    /// Get the number of extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Check if the extension list is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Encode all extensions with the 2-byte total length prefix.
    pub fn encode(&self) -> Vec<u8> {
        let body: Vec<u8> = self.extensions.iter().flat_map(|e| e.encode()).collect();
        let mut buf = BytesMut::with_capacity(2 + body.len());
        buf.put_u16(body.len() as u16);
        buf.put_slice(&body);
        buf.to_vec()
    }

    /// Decode a length-prefixed extension block.
    ///
    /// The same extension type appearing twice is an `illegal_parameter`
    /// condition (RFC 5246 Section 7.4.1.4).
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(Error::InvalidMessage("Extensions too short".into()));
        }

        let total_length = u16::from_be_bytes([data[0], data[1]]) as usize;
        if data.len() != 2 + total_length {
            return Err(Error::InvalidMessage("Extension block length mismatch".into()));
        }

        let mut extensions = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 2;
        while offset < data.len() {
            let (ext, consumed) = Extension::decode(&data[offset..])?;
            if !seen.insert(ext.extension_type) {
                return Err(Error::ProtocolError(ProtocolError::IllegalParameter));
            }
            extensions.push(ext);
            offset += consumed;
        }

        Ok(Self { extensions })
    }
}

fn put_u16_list(values: impl ExactSizeIterator<Item = u16>) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(2 + values.len() * 2);
    buf.put_u16((values.len() * 2) as u16);
    for value in values {
        buf.put_u16(value);
    }
    buf.to_vec()
}

fn get_u16_list(data: &[u8], what: &str) -> Result<Vec<u16>> {
    if data.len() < 2 {
        return Err(Error::InvalidMessage(format!("{} extension too short", what)));
    }
    let mut bytes = data;
    let list_len = bytes.get_u16() as usize;
    if bytes.len() != list_len || list_len % 2 != 0 || list_len == 0 {
        return Err(Error::InvalidMessage(format!("Malformed {} list", what)));
    }
    Ok((0..list_len / 2).map(|_| bytes.get_u16()).collect())
}

/// Create a `server_name` extension carrying one `host_name` entry.
pub fn server_name_extension(hostname: &str) -> Result<Extension> {
    let name = hostname.as_bytes();
    if name.is_empty() || name.len() > 0xFFFF - 5 {
        return Err(Error::InvalidMessage("Invalid server name length".into()));
    }

    let mut buf = BytesMut::new();
    buf.put_u16((name.len() + 3) as u16);
    buf.put_u8(0); // host_name
    buf.put_u16(name.len() as u16);
    buf.put_slice(name);

    Ok(Extension::new(ExtensionType::ServerName, buf.to_vec()))
}

/// Parse a `server_name` extension, returning the host name.
pub fn parse_server_name(data: &[u8]) -> Result<String> {
    let mut bytes = data;
    if bytes.len() < 5 {
        return Err(Error::InvalidMessage("server_name extension too short".into()));
    }
    let list_len = bytes.get_u16() as usize;
    if bytes.len() != list_len {
        return Err(Error::InvalidMessage("Malformed server_name list".into()));
    }

    while bytes.remaining() >= 3 {
        let name_type = bytes.get_u8();
        let name_len = bytes.get_u16() as usize;
        if bytes.len() < name_len {
            return Err(Error::InvalidMessage("Incomplete server name".into()));
        }
        let name = &bytes[..name_len];
        bytes.advance(name_len);

        if name_type == 0 {
            return String::from_utf8(name.to_vec())
                .map_err(|_| Error::InvalidMessage("Server name is not valid UTF-8".into()));
        }
    }

    Err(Error::InvalidMessage("No host_name in server_name".into()))
}

/// Create a `supported_groups` extension.
pub fn supported_groups_extension(groups: &[KeyExchangeAlgorithm]) -> Extension {
    Extension::new(
        ExtensionType::SupportedGroups,
        put_u16_list(groups.iter().map(|g| g.to_u16())),
    )
}

/// Parse a `supported_groups` extension; unknown groups are skipped.
pub fn parse_supported_groups(data: &[u8]) -> Result<Vec<KeyExchangeAlgorithm>> {
    Ok(get_u16_list(data, "supported_groups")?
        .into_iter()
        .filter_map(KeyExchangeAlgorithm::from_u16)
        .collect())
}

/// Create an `ec_point_formats` extension offering only `uncompressed`.
pub fn ec_point_formats_extension() -> Extension {
    Extension::new(
        ExtensionType::EcPointFormats,
        vec![1, EC_POINT_FORMAT_UNCOMPRESSED],
    )
}

/// Parse an `ec_point_formats` extension.
pub fn parse_ec_point_formats(data: &[u8]) -> Result<Vec<u8>> {
    match data.split_first() {
        Some((&len, formats)) if len as usize == formats.len() && len > 0 => Ok(formats.to_vec()),
        _ => Err(Error::InvalidMessage("Malformed ec_point_formats".into())),
    }
}

/// Create a `signature_algorithms` extension.
pub fn signature_algorithms_extension(algorithms: &[SignatureAlgorithm]) -> Extension {
    Extension::new(
        ExtensionType::SignatureAlgorithms,
        put_u16_list(algorithms.iter().map(|a| a.to_u16())),
    )
}

/// Parse a `signature_algorithms` extension; unknown schemes are skipped.
pub fn parse_signature_algorithms(data: &[u8]) -> Result<Vec<SignatureAlgorithm>> {
    Ok(get_u16_list(data, "signature_algorithms")?
        .into_iter()
        .filter_map(SignatureAlgorithm::from_u16)
        .collect())
}

/// Create an ALPN extension from protocol identifiers.
pub fn alpn_extension<P: AsRef<[u8]>>(protocols: &[P]) -> Result<Extension> {
    let mut list = BytesMut::new();
    for protocol in protocols {
        let protocol = protocol.as_ref();
        if protocol.is_empty() || protocol.len() > 255 {
            return Err(Error::InvalidConfig(
                "ALPN protocol names must be 1..=255 bytes".into(),
            ));
        }
        list.put_u8(protocol.len() as u8);
        list.put_slice(protocol);
    }

    let mut buf = BytesMut::with_capacity(2 + list.len());
    buf.put_u16(list.len() as u16);
    buf.put_slice(&list);
    Ok(Extension::new(
        ExtensionType::ApplicationLayerProtocolNegotiation,
        buf.to_vec(),
    ))
}

/// Parse an ALPN extension into protocol identifiers.
pub fn parse_alpn(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut bytes = data;
    if bytes.len() < 2 {
        return Err(Error::InvalidMessage("ALPN extension too short".into()));
    }
    let list_len = bytes.get_u16() as usize;
    if bytes.len() != list_len || list_len == 0 {
        return Err(Error::InvalidMessage("Malformed ALPN list".into()));
    }

    let mut protocols = Vec::new();
    while bytes.has_remaining() {
        let len = bytes.get_u8() as usize;
        if len == 0 || bytes.len() < len {
            return Err(Error::InvalidMessage("Malformed ALPN protocol name".into()));
        }
        protocols.push(bytes[..len].to_vec());
        bytes.advance(len);
    }
    Ok(protocols)
}

/// Create an (empty) `extended_master_secret` extension.
pub fn extended_master_secret_extension() -> Extension {
    Extension::new(ExtensionType::ExtendedMasterSecret, Vec::new())
}

/// Create a `renegotiation_info` extension.
///
/// On an initial handshake `renegotiated_connection` is empty, which is the
/// only form this engine ever sends.
pub fn renegotiation_info_extension(renegotiated_connection: &[u8]) -> Extension {
    let mut data = Vec::with_capacity(1 + renegotiated_connection.len());
    data.push(renegotiated_connection.len() as u8);
    data.extend_from_slice(renegotiated_connection);
    Extension::new(ExtensionType::RenegotiationInfo, data)
}

/// Parse a `renegotiation_info` extension.
pub fn parse_renegotiation_info(data: &[u8]) -> Result<Vec<u8>> {
    match data.split_first() {
        Some((&len, rest)) if len as usize == rest.len() => Ok(rest.to_vec()),
        _ => Err(Error::InvalidMessage("Malformed renegotiation_info".into())),
    }
}

/// Create the ClientHello form of `supported_versions`.
///
/// This engine never sends it; it exists so tests and tools can emulate
/// TLS 1.3 peers.
pub fn supported_versions_client_extension(versions: &[u16]) -> Extension {
    let mut data = Vec::with_capacity(1 + versions.len() * 2);
    data.push((versions.len() * 2) as u8);
    for version in versions {
        data.extend_from_slice(&version.to_be_bytes());
    }
    Extension::new(ExtensionType::SupportedVersions, data)
}

/// Parse the ClientHello form of `supported_versions`.
pub fn parse_supported_versions_client(data: &[u8]) -> Result<Vec<u16>> {
    match data.split_first() {
        Some((&len, rest)) if len as usize == rest.len() && len >= 2 && len % 2 == 0 => Ok(rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect()),
        _ => Err(Error::InvalidMessage("Malformed supported_versions".into())),
    }
}

/// Create the ServerHello form of `supported_versions` (one selected version).
pub fn supported_versions_server_extension(version: u16) -> Extension {
    Extension::new(
        ExtensionType::SupportedVersions,
        version.to_be_bytes().to_vec(),
    )
}

/// Parse the ServerHello form of `supported_versions`.
pub fn parse_supported_versions_server(data: &[u8]) -> Result<u16> {
    match data {
        [hi, lo] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(Error::InvalidMessage("Malformed selected version".into())),
    }
}

/// Groups offered and accepted by default, in preference order.
pub fn default_supported_groups() -> Vec<KeyExchangeAlgorithm> {
    vec![KeyExchangeAlgorithm::X25519, KeyExchangeAlgorithm::Secp256r1]
}

/// Signature schemes offered and accepted by default.
pub fn default_signature_algorithms() -> Vec<SignatureAlgorithm> {
    vec![SignatureAlgorithm::EcdsaSecp256r1Sha256]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_list_skips_unknown_types() {
        let mut exts = Extensions::new();
        exts.add(Extension::new(ExtensionType::Unknown(0x1A1A), vec![]));
        exts.add(extended_master_secret_extension());

        let decoded = Extensions::decode(&exts.encode()).unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(decoded.has(ExtensionType::ExtendedMasterSecret));
        assert!(decoded.has(ExtensionType::Unknown(0x1A1A)));
    }

    #[test]
    fn test_duplicate_extension_rejected() {
        let mut exts = Extensions::new();
        exts.add(extended_master_secret_extension());
        exts.add(extended_master_secret_extension());
        assert_eq!(
            Extensions::decode(&exts.encode()),
            Err(Error::ProtocolError(ProtocolError::IllegalParameter))
        );
    }

    #[test]
    fn test_server_name() {
        let ext = server_name_extension("example.com").unwrap();
        assert_eq!(&ext.data[..5], &[0x00, 0x0E, 0x00, 0x00, 0x0B]);
        assert_eq!(parse_server_name(&ext.data).unwrap(), "example.com");
        assert!(server_name_extension("").is_err());
    }

    #[test]
    fn test_supported_groups_ignores_unknown() {
        // x25519, a GREASE value, secp256r1, x25519mlkem768
        let data = [0x00, 0x08, 0x00, 0x1D, 0x3A, 0x3A, 0x00, 0x17, 0x11, 0xEC];
        assert_eq!(
            parse_supported_groups(&data).unwrap(),
            vec![KeyExchangeAlgorithm::X25519, KeyExchangeAlgorithm::Secp256r1]
        );
        assert!(parse_supported_groups(&[0x00, 0x03, 0x00, 0x1D, 0x00]).is_err());
    }

    #[test]
    fn test_signature_algorithms() {
        let ext = signature_algorithms_extension(&default_signature_algorithms());
        assert_eq!(ext.data, vec![0x00, 0x02, 0x04, 0x03]);
        assert_eq!(
            parse_signature_algorithms(&ext.data).unwrap(),
            vec![SignatureAlgorithm::EcdsaSecp256r1Sha256]
        );
    }

    #[test]
    fn test_alpn() {
        let ext = alpn_extension(&["h2", "http/1.1"]).unwrap();
        assert_eq!(
            parse_alpn(&ext.data).unwrap(),
            vec![b"h2".to_vec(), b"http/1.1".to_vec()]
        );
        assert!(alpn_extension(&[""]).is_err());
        assert!(parse_alpn(&[0x00, 0x02, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_point_formats_and_renegotiation_info() {
        assert_eq!(ec_point_formats_extension().data, vec![1, 0]);
        assert_eq!(parse_ec_point_formats(&[2, 1, 0]).unwrap(), vec![1, 0]);
        assert!(parse_ec_point_formats(&[]).is_err());

        let ri = renegotiation_info_extension(&[]);
        assert_eq!(ri.data, vec![0]);
        assert_eq!(parse_renegotiation_info(&ri.data).unwrap(), Vec::<u8>::new());
        assert!(parse_renegotiation_info(&[3, 1]).is_err());
    }

    #[test]
    fn test_supported_versions_forms() {
        let ext = supported_versions_client_extension(&[0x0304, 0x0303]);
        assert_eq!(ext.data, vec![4, 0x03, 0x04, 0x03, 0x03]);
        assert_eq!(
            parse_supported_versions_client(&ext.data).unwrap(),
            vec![0x0304, 0x0303]
        );

        let ext = supported_versions_server_extension(0x0304);
        assert_eq!(parse_supported_versions_server(&ext.data).unwrap(), 0x0304);
        assert!(parse_supported_versions_server(&[3]).is_err());
    }
}

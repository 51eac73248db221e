//! Protocol version negotiation.
//!
//! Only TLS 1.2 is enabled in this build (see
//! [`ENABLED_PROTOCOL_VERSIONS`]). Both directions of negotiation are
//! handled here:
//!
//! - A server receiving a ClientHello selects TLS 1.2 or refuses the
//!   connection with a `protocol_version` alert. A TLS 1.3 client that
//!   also lists 0x0303 in `supported_versions` is served TLS 1.2.
//! - A client receiving a ServerHello accepts only 0x0303 and rejects
//!   every TLS 1.3 signal: a `supported_versions` selection or the
//!   HelloRetryRequest random.
//!
//! The TLS 1.3 downgrade sentinel in the last 8 bytes of the server random
//! is not checked: a TLS 1.2-only client is the party the sentinel
//! protects against, not the one that checks it.

use crate::error::{Error, ProtocolError, Result};
use crate::extensions::{parse_supported_versions_client, parse_supported_versions_server};
use crate::messages::{ClientHello, ServerHello};
use crate::protocol::{ExtensionType, ProtocolVersion, ENABLED_PROTOCOL_VERSIONS};
use tracing::{debug, warn};

/// `Random` value that marks a ServerHello as a TLS 1.3 HelloRetryRequest
/// (RFC 8446 Section 4.1.3): SHA-256("HelloRetryRequest").
pub const HELLO_RETRY_REQUEST_RANDOM: [u8; 32] = [
    0xCF, 0x21, 0xAD, 0x74, 0xE5, 0x9A, 0x61, 0x11, 0xBE, 0x1D, 0x8C, 0x02, 0x1E, 0x65, 0xB8, 0x91,
    0xC2, 0xA2, 0x11, 0x16, 0x7A, 0xBB, 0x8C, 0x5E, 0x07, 0x9E, 0x09, 0xE2, 0xC8, 0xA8, 0x33, 0x9C,
];

/// The legacy_version the client places in its ClientHello.
///
/// No `supported_versions` extension accompanies it: the list would hold
/// TLS 1.2 alone, which is exactly what 0x0303 already says.
pub const fn client_hello_versions() -> u16 {
    ProtocolVersion::Tls12.to_u16()
}

fn protocol_version_error() -> Error {
    Error::ProtocolError(ProtocolError::ProtocolVersion)
}

/// Select the protocol version for a received ClientHello.
pub fn negotiate_server_version(client_hello: &ClientHello) -> Result<ProtocolVersion> {
    if let Some(ext) = client_hello.extensions.get(ExtensionType::SupportedVersions) {
        let offered = parse_supported_versions_client(&ext.data)?;
        debug!(?offered, "ClientHello carries supported_versions");

        return pick_enabled(offered.iter().copied()).ok_or_else(|| {
            warn!(
                ?offered,
                "Client offers no enabled protocol version (TLS 1.3 is disabled)"
            );
            protocol_version_error()
        });
    }

    let legacy = client_hello.client_version;
    if legacy >= ProtocolVersion::Tls12.to_u16() {
        // A newer legacy_version without supported_versions still speaks 1.2
        Ok(ProtocolVersion::Tls12)
    } else {
        warn!(
            client_version = legacy,
            "Client maximum version is below TLS 1.2"
        );
        Err(protocol_version_error())
    }
}

/// Highest enabled version among the offered wire values.
fn pick_enabled(offered: impl Iterator<Item = u16>) -> Option<ProtocolVersion> {
    offered
        .filter_map(ProtocolVersion::from_u16)
        .filter(|v| ENABLED_PROTOCOL_VERSIONS.contains(v))
        .max_by_key(|v| v.to_u16())
}

/// Validate the version a server selected in its ServerHello.
pub fn check_server_hello_version(server_hello: &ServerHello) -> Result<ProtocolVersion> {
    if server_hello.random == HELLO_RETRY_REQUEST_RANDOM {
        warn!("Server sent a TLS 1.3 HelloRetryRequest");
        return Err(protocol_version_error());
    }

    if let Some(ext) = server_hello.extensions.get(ExtensionType::SupportedVersions) {
        let selected = parse_supported_versions_server(&ext.data)?;
        warn!(
            selected,
            "Server selected a version through supported_versions"
        );
        return Err(protocol_version_error());
    }

    match ProtocolVersion::from_u16(server_hello.server_version) {
        Some(version) if version.is_enabled() => Ok(version),
        _ => {
            warn!(
                server_version = server_hello.server_version,
                "Server selected a protocol version that is not enabled"
            );
            Err(protocol_version_error())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher_suites::{default_cipher_suites, CipherSuite};
    use crate::extensions::{
        supported_versions_client_extension, supported_versions_server_extension, Extensions,
    };

    fn client_hello(versions: Option<&[u16]>) -> ClientHello {
        let mut extensions = Extensions::new();
        if let Some(versions) = versions {
            extensions.add(supported_versions_client_extension(versions));
        }
        ClientHello::new([1u8; 32], &default_cipher_suites()).with_extensions(extensions)
    }

    #[test]
    fn test_tls13_is_disabled() {
        assert!(!ProtocolVersion::Tls13.is_enabled());
        assert!(ProtocolVersion::Tls12.is_enabled());
        assert_eq!(client_hello_versions(), 0x0303);
    }

    #[test]
    fn test_server_selects_tls12() {
        assert_eq!(
            negotiate_server_version(&client_hello(None)),
            Ok(ProtocolVersion::Tls12)
        );
        assert_eq!(
            negotiate_server_version(&client_hello(Some(&[0x0304, 0x0303]))),
            Ok(ProtocolVersion::Tls12)
        );
    }

    #[test]
    fn test_server_rejects_tls13_only_client() {
        let err = negotiate_server_version(&client_hello(Some(&[0x0304]))).unwrap_err();
        assert_eq!(err, Error::ProtocolError(ProtocolError::ProtocolVersion));
        assert!(err.is_version_mismatch());
    }

    #[test]
    fn test_server_rejects_old_client() {
        let mut hello = client_hello(None);
        hello.client_version = 0x0302;
        assert!(negotiate_server_version(&hello).is_err());

        let hello = client_hello(Some(&[0x0302, 0x0301]));
        assert!(negotiate_server_version(&hello).is_err());
    }

    #[test]
    fn test_client_checks_server_hello() {
        let hello = ServerHello::new([3u8; 32], CipherSuite::EcdheEcdsaWithAes128GcmSha256);
        assert_eq!(check_server_hello_version(&hello), Ok(ProtocolVersion::Tls12));

        let mut old = hello.clone();
        old.server_version = 0x0301;
        assert!(check_server_hello_version(&old).is_err());
    }

    #[test]
    fn test_client_rejects_tls13_server_hello() {
        let mut extensions = Extensions::new();
        extensions.add(supported_versions_server_extension(0x0304));
        let hello = ServerHello::new([3u8; 32], CipherSuite::EcdheEcdsaWithAes128GcmSha256)
            .with_extensions(extensions);

        assert_eq!(
            check_server_hello_version(&hello),
            Err(Error::ProtocolError(ProtocolError::ProtocolVersion))
        );
    }

    #[test]
    fn test_client_rejects_hello_retry_request() {
        let hello = ServerHello::new(
            HELLO_RETRY_REQUEST_RANDOM,
            CipherSuite::EcdheEcdsaWithAes128GcmSha256,
        );
        assert!(check_server_hello_version(&hello).is_err());
    }
}

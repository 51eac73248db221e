//! TLS 1.2 handshake message bodies.
//!
//! Each type encodes and decodes the body only; the 4-byte handshake
//! header is handled by [`crate::handshake_io::HandshakeMessage`].

pub mod certificate;
pub mod certificate_request;
pub mod client_hello;
pub mod client_key_exchange;
pub mod finished;
pub mod server_hello;
pub mod server_hello_done;
pub mod server_key_exchange;

pub use certificate::CertificateMessage;
pub use certificate_request::CertificateRequest;
pub use client_hello::ClientHello;
pub use client_key_exchange::ClientKeyExchange;
pub use finished::Finished;
pub use server_hello::ServerHello;
pub use server_hello_done::ServerHelloDone;
pub use server_key_exchange::ServerKeyExchange;

use crate::error::{Error, Result};
use bytes::Buf;

fn truncated(what: &str) -> Error {
    Error::InvalidMessage(format!("Truncated {}", what))
}

pub(crate) fn read_u8(data: &mut &[u8], what: &str) -> Result<u8> {
    if data.remaining() < 1 {
        return Err(truncated(what));
    }
    Ok(data.get_u8())
}

pub(crate) fn read_u16(data: &mut &[u8], what: &str) -> Result<u16> {
    if data.remaining() < 2 {
        return Err(truncated(what));
    }
    Ok(data.get_u16())
}

pub(crate) fn read_bytes<'a>(data: &mut &'a [u8], len: usize, what: &str) -> Result<&'a [u8]> {
    if data.len() < len {
        return Err(truncated(what));
    }
    let (head, tail) = data.split_at(len);
    *data = tail;
    Ok(head)
}

/// Read an opaque vector with a 1-byte length prefix.
pub(crate) fn read_vec_u8<'a>(data: &mut &'a [u8], what: &str) -> Result<&'a [u8]> {
    let len = read_u8(data, what)? as usize;
    read_bytes(data, len, what)
}

/// Read an opaque vector with a 2-byte length prefix.
pub(crate) fn read_vec_u16<'a>(data: &mut &'a [u8], what: &str) -> Result<&'a [u8]> {
    let len = read_u16(data, what)? as usize;
    read_bytes(data, len, what)
}

/// Read an opaque vector with a 3-byte length prefix.
pub(crate) fn read_vec_u24<'a>(data: &mut &'a [u8], what: &str) -> Result<&'a [u8]> {
    if data.remaining() < 3 {
        return Err(truncated(what));
    }
    let len = data.get_uint(3) as usize;
    read_bytes(data, len, what)
}

pub(crate) fn expect_end(data: &[u8], what: &str) -> Result<()> {
    if data.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidMessage(format!(
            "{} trailing bytes after {}",
            data.len(),
            what
        )))
    }
}

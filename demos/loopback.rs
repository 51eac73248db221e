//! TLS 1.2 over loopback.
//!
//! Starts a server on an ephemeral port, connects a client to it, sends a
//! line and prints the echo.
//!
//! Run with:
//! ```text
//! RUST_LOG=debug cargo run -p tls12only --example loopback
//! ```

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use tls12only::{ClientConfig, ServerConfig, TlsStream};

const SERVER_CERT: &[u8] = include_bytes!("../testdata/server.der");
const SERVER_KEY: &[u8] = include_bytes!("../testdata/server.key");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("tls12only {}", tls12only::version());

    let server_config = ServerConfig::builder()
        .with_certificate_chain(vec![SERVER_CERT.to_vec()])
        .with_private_key(SERVER_KEY.to_vec())
        .with_alpn_protocols(vec!["echo/1".to_string()])
        .build()?;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    println!("Server listening on {}", addr);

    let server = thread::spawn(move || -> tls12only::Result<()> {
        let (tcp, peer) = listener.accept()?;
        let tls = TlsStream::accept(server_config, tcp)?;
        println!(
            "[server] {} connected: {:?}, SNI {:?}",
            peer,
            tls.negotiated_cipher_suite(),
            tls.server_name()
        );

        let mut reader = BufReader::new(tls);
        let mut line = String::new();
        reader.read_line(&mut line)?;

        let mut tls = reader.into_inner();
        tls.write_all(line.to_uppercase().as_bytes())?;
        tls.close()
    });

    let client_config = ClientConfig::builder()
        .add_root_certificate(SERVER_CERT.to_vec())
        .with_alpn_protocols(vec!["echo/1".to_string()])
        .build()?;

    let tcp = TcpStream::connect(addr)?;
    let mut tls = TlsStream::connect(client_config, "localhost", tcp)?;
    println!(
        "[client] {:?} with {:?}, ALPN {:?}",
        tls.protocol_version(),
        tls.negotiated_cipher_suite(),
        tls.alpn_protocol().map(String::from_utf8_lossy)
    );

    tls.write_all(b"hello from a TLS 1.2-only client\n")?;

    let mut reader = BufReader::new(tls);
    let mut echo = String::new();
    reader.read_line(&mut echo)?;
    print!("[client] received: {}", echo);

    reader.into_inner().close()?;
    server
        .join()
        .map_err(|_| "server thread panicked")??;

    Ok(())
}

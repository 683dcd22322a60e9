use derivative::Derivative;
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::authenticators::SaslAuthenticator;

#[derive(Debug)]
enum Stream {
    Tcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

/// Established connection to a single node, optionally secured with TLS.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Connection {
    address: SocketAddr,
    stream: Stream,
    #[derivative(Debug = "ignore")]
    authenticator: Option<Box<dyn SaslAuthenticator + Send + Sync>>,
}

impl Connection {
    /// Opens a TCP connection and performs a TLS handshake, if TLS configuration is given.
    pub async fn open(
        address: SocketAddr,
        server_name: ServerName<'static>,
        tls: Option<Arc<ClientConfig>>,
        authenticator: Option<Box<dyn SaslAuthenticator + Send + Sync>>,
    ) -> io::Result<Self> {
        let socket = TcpStream::connect(address).await?;
        socket.set_nodelay(true)?;

        let stream = match tls {
            Some(config) => {
                let connector = TlsConnector::from(config);
                let stream = connector.connect(server_name, socket).await?;
                Stream::Tls(Box::new(stream))
            }
            None => Stream::Tcp(socket),
        };

        Ok(Connection {
            address,
            stream,
            authenticator,
        })
    }

    #[inline]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    #[inline]
    pub fn is_secure(&self) -> bool {
        matches!(self.stream, Stream::Tls(_))
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.authenticator.is_some()
    }

    /// Authenticator created for this connection, for the protocol layer to run the SASL
    /// exchange with.
    #[inline]
    pub fn authenticator(&self) -> Option<&(dyn SaslAuthenticator + Send + Sync)> {
        self.authenticator.as_deref()
    }

    /// Gracefully shuts the connection down.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        match &mut self.stream {
            Stream::Tcp(stream) => stream.shutdown().await,
            Stream::Tls(stream) => stream.shutdown().await,
        }
    }
}

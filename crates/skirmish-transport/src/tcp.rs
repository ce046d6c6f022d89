//! TCP transport: length-prefixed frames, each sealed by a [`Cipher`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::framing::{read_frame, write_frame};
use crate::{Cipher, Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
    cipher: Arc<dyn Cipher>,
}

impl TcpTransport {
    /// Binds a listener to `addr`. Every accepted connection uses `cipher`.
    pub async fn bind(
        addr: &str,
        cipher: Arc<dyn Cipher>,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            TransportError::BindFailed {
                addr: addr.to_string(),
                source,
            }
        })?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener, cipher })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        let conn = TcpConnection::from_stream(
            stream,
            addr,
            Arc::clone(&self.cipher),
        );
        tracing::debug!(id = %conn.id, %addr, "accepted TCP connection");
        Ok(conn)
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A single framed TCP connection.
///
/// Read and write halves are locked independently so one task can block
/// in `recv` while another sends.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    cipher: Arc<dyn Cipher>,
}

impl TcpConnection {
    /// Opens a client connection to `addr`.
    pub async fn connect(
        addr: &str,
        cipher: Arc<dyn Cipher>,
    ) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let peer = stream.peer_addr().map_err(TransportError::AcceptFailed)?;
        Ok(Self::from_stream(stream, peer, cipher))
    }

    fn from_stream(
        stream: TcpStream,
        peer: SocketAddr,
        cipher: Arc<dyn Cipher>,
    ) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }
        let (reader, writer) = stream.into_split();
        Self {
            id: ConnectionId::new(
                NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            ),
            peer,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            cipher,
        }
    }

    /// The remote address of this connection.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Resolves once the peer has hung up or the socket has failed.
    ///
    /// Only peeks, so no frame is consumed and dropping the future at any
    /// point is safe. If unread bytes are waiting, the peer is still there
    /// and this never resolves; drop it and read them with `recv`. The
    /// read half stays locked while it runs.
    pub async fn closed(&self) {
        let mut byte = [0u8; 1];
        let mut reader = self.reader.lock().await;
        match reader.peek(&mut byte).await {
            Ok(0) => tracing::debug!(id = %self.id, "peer hung up"),
            Ok(_) => std::future::pending::<()>().await,
            Err(e) => tracing::debug!(id = %self.id, error = %e, "socket failed"),
        }
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let sealed = self.cipher.seal(data)?;
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &sealed)
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let frame = {
            let mut reader = self.reader.lock().await;
            read_frame(&mut *reader)
                .await
                .map_err(TransportError::ReceiveFailed)?
        };
        match frame {
            Some(sealed) => self.cipher.open(&sealed).map(Some),
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

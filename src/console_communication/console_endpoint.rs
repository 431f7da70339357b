use super::aegis_messages;
use crate::{event, warn};
use prost::Message;
use std::{
    io::{Cursor, ErrorKind},
    net::SocketAddr,
    sync::Arc,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::net::tcp::{ReadHalf, WriteHalf};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Identifies one console connection for the lifetime of the endpoint.
pub(crate) type ConnectionId = u64;

#[derive(Debug, Clone)]
pub(crate) enum ConsoleEvent {
    Connected(ConnectionId),
    Disconnected(ConnectionId),
    Message(ConnectionId, aegis_messages::UpstreamContent),
}

/// An encoded downstream frame and its addressee, `None` meaning every connection.
#[derive(Debug, Clone)]
struct Outgoing {
    target: Option<ConnectionId>,
    payload: Arc<Vec<u8>>,
}

/// TCP endpoint of the operator console.
///
/// Every frame in either direction is a big-endian `u32` length followed by a protobuf
/// message. Upstream traffic is forwarded as [`ConsoleEvent`]s, downstream frames are
/// fanned out to the addressed connection or to all of them.
pub(crate) struct ConsoleEndpoint {
    /// Downstream frames, `None` tells every connection task to shut down.
    downstream_sender: broadcast::Sender<Option<Outgoing>>,
    close_oneshot_sender: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
}

impl ConsoleEndpoint {
    /// Upper bound for a single upstream frame.
    const MAX_FRAME_LEN: u32 = 1 << 20;
    /// Capacity of the downstream channel, lagging connections skip frames.
    const DOWNSTREAM_CAP: usize = 1024;
    const UPSTREAM_CAP: usize = 256;

    async fn handle_connection_rx(
        socket: &mut ReadHalf<'_>,
        upstream_event_sender: &mpsc::Sender<ConsoleEvent>,
        conn: ConnectionId,
    ) -> Result<(), std::io::Error> {
        loop {
            let buffer = read_frame(socket).await?;
            match aegis_messages::Upstream::decode(&mut Cursor::new(buffer)) {
                Ok(aegis_messages::Upstream { content: Some(content) }) => {
                    if upstream_event_sender.send(ConsoleEvent::Message(conn, content)).await.is_err() {
                        return Ok(());
                    }
                }
                Ok(_) => event!("Empty upstream frame from connection {conn}."),
                Err(e) => event!("Undecodable frame from connection {conn}: {e}"),
            }
        }
    }

    async fn handle_connection_tx(
        socket: &mut WriteHalf<'_>,
        downstream_receiver: &mut broadcast::Receiver<Option<Outgoing>>,
        conn: ConnectionId,
    ) -> Result<(), std::io::Error> {
        loop {
            match downstream_receiver.recv().await {
                Ok(Some(out)) => {
                    if out.target.is_none_or(|t| t == conn) {
                        write_frame(socket, &out.payload).await?;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    event!("Connection {conn} lagging, skipped {skipped} frames.");
                }
                Ok(None) | Err(broadcast::error::RecvError::Closed) => return Ok(()),
            }
        }
    }

    /// Binds the listener and spawns the accept loop.
    ///
    /// # Arguments
    /// * `addr` - The socket address to listen on, port `0` picks a free port.
    ///
    /// # Returns
    /// The endpoint and the receiver of upstream events, or the bind error.
    pub(crate) async fn start(
        addr: SocketAddr,
    ) -> Result<(Self, mpsc::Receiver<ConsoleEvent>), std::io::Error> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (downstream_sender, _) = broadcast::channel(Self::DOWNSTREAM_CAP);
        let (upstream_event_sender, upstream_event_receiver) = mpsc::channel(Self::UPSTREAM_CAP);
        let (close_oneshot_sender, mut close_oneshot_receiver) = oneshot::channel();
        let inst = Self {
            downstream_sender: downstream_sender.clone(),
            close_oneshot_sender: Some(close_oneshot_sender),
            local_addr,
        };

        tokio::spawn(async move {
            let mut next_conn: ConnectionId = 0;
            loop {
                let accept = tokio::select! {
                    accept = listener.accept() => accept,
                    _ = &mut close_oneshot_receiver => break
                };

                let Ok((mut socket, peer)) = accept else { break };
                let conn = next_conn;
                next_conn += 1;
                // subscribe before announcing, so the reply to `Connected` is not missed
                let mut downstream_receiver = downstream_sender.subscribe();
                if upstream_event_sender.send(ConsoleEvent::Connected(conn)).await.is_err() {
                    break;
                }
                event!("Console connection {conn} from {peer}.");
                let upstream_event_sender_local = upstream_event_sender.clone();

                tokio::spawn(async move {
                    let (mut rx_socket, mut tx_socket) = socket.split();

                    let result = tokio::select! {
                        res = ConsoleEndpoint::handle_connection_tx(&mut tx_socket, &mut downstream_receiver, conn) => res,
                        res = ConsoleEndpoint::handle_connection_rx(&mut rx_socket, &upstream_event_sender_local, conn) => res
                    };

                    let _ = upstream_event_sender_local.send(ConsoleEvent::Disconnected(conn)).await;
                    match result {
                        Err(e)
                            if e.kind() == ErrorKind::UnexpectedEof
                                || e.kind() == ErrorKind::ConnectionReset
                                || e.kind() == ErrorKind::ConnectionAborted =>
                        {
                            return;
                        }
                        Err(e) => {
                            warn!("Closing console connection {conn} due to {e:?}");
                        }
                        Ok(()) => {}
                    }
                    let _ = socket.shutdown().await;
                });
            }
        });
        Ok((inst, upstream_event_receiver))
    }

    /// Sends a message to one connection, or to all if `target` is `None`.
    pub(crate) fn send_downstream(
        &self,
        msg: aegis_messages::DownstreamContent,
        target: Option<ConnectionId>,
    ) {
        let payload = aegis_messages::Downstream { content: Some(msg) }.encode_to_vec();
        let _ = self.downstream_sender.send(Some(Outgoing { target, payload: Arc::new(payload) }));
    }

    pub(crate) fn is_console_connected(&self) -> bool { self.downstream_sender.receiver_count() > 0 }

    pub(crate) fn local_addr(&self) -> SocketAddr { self.local_addr }
}

impl Drop for ConsoleEndpoint {
    fn drop(&mut self) {
        if let Some(close) = self.close_oneshot_sender.take() {
            let _ = close.send(());
        }
        let _ = self.downstream_sender.send(None);
    }
}

/// Reads one length-prefixed frame.
pub(crate) async fn read_frame<R: AsyncRead + Unpin>(socket: &mut R) -> Result<Vec<u8>, std::io::Error> {
    let length = socket.read_u32().await?;
    if length > ConsoleEndpoint::MAX_FRAME_LEN {
        return Err(std::io::Error::new(
            ErrorKind::InvalidData,
            format!("frame of {length} bytes exceeds limit"),
        ));
    }
    let mut buffer = vec![0u8; length as usize];
    socket.read_exact(&mut buffer).await?;
    Ok(buffer)
}

/// Writes one length-prefixed frame.
#[allow(clippy::cast_possible_truncation)]
pub(crate) async fn write_frame<W: AsyncWrite + Unpin>(socket: &mut W, payload: &[u8]) -> Result<(), std::io::Error> {
    socket.write_u32(payload.len() as u32).await?;
    socket.write_all(payload).await?;
    socket.flush().await
}

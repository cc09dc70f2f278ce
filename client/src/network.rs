//! Connection to the host, run on a tokio runtime off the render thread

use log::{error, info, warn};
use shared::codec::{read_packet, write_packet};
use shared::{Packet, PROTOCOL_VERSION};
use std::io;
use std::thread;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// What the network side hands to the frame loop
#[derive(Debug)]
pub enum NetworkEvent {
    Received(Packet),
    Closed(String),
}

/// Frame-loop handle on the background connection
pub struct NetworkClient {
    outgoing: UnboundedSender<Packet>,
    incoming: UnboundedReceiver<NetworkEvent>,
}

impl NetworkClient {
    /// Starts a background thread with its own runtime and connects to `server_addr`.
    pub fn spawn(server_addr: String) -> io::Result<Self> {
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming) = mpsc::unbounded_channel();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("network".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    if let Err(e) = run_connection(&server_addr, outgoing_rx, incoming_tx.clone()).await
                    {
                        error!("Connection to {} failed: {}", server_addr, e);
                        let _ = incoming_tx.send(NetworkEvent::Closed(e.to_string()));
                    }
                });
            })?;

        Ok(Self { outgoing, incoming })
    }

    pub fn send(&self, packet: Packet) -> bool {
        self.outgoing.send(packet).is_ok()
    }

    /// Everything that arrived since the last frame.
    pub fn poll(&mut self) -> Vec<NetworkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.incoming.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn disconnect(&self) {
        let _ = self.outgoing.send(Packet::Disconnect);
    }
}

/// Connects, introduces itself, then pumps packets both ways until either side closes.
pub async fn run_connection(
    server_addr: &str,
    mut outgoing: UnboundedReceiver<Packet>,
    incoming: UnboundedSender<NetworkEvent>,
) -> io::Result<()> {
    info!("Connecting to server at {}...", server_addr);
    let stream = TcpStream::connect(server_addr).await?;
    stream.set_nodelay(true)?;
    let (mut read_half, mut write_half) = stream.into_split();

    write_packet(
        &mut write_half,
        &Packet::Connect {
            client_version: PROTOCOL_VERSION,
        },
    )
    .await?;

    let reader = tokio::spawn(async move {
        let reason = loop {
            match read_packet(&mut read_half).await {
                Ok(Some(packet)) => {
                    if incoming.send(NetworkEvent::Received(packet)).is_err() {
                        return;
                    }
                }
                Ok(None) => break "Connection closed by server".to_string(),
                Err(e) => {
                    warn!("Error receiving packet: {}", e);
                    break e.to_string();
                }
            }
        };
        let _ = incoming.send(NetworkEvent::Closed(reason));
    });

    while let Some(packet) = outgoing.recv().await {
        let leaving = matches!(packet, Packet::Disconnect);
        write_packet(&mut write_half, &packet).await?;
        if leaving {
            break;
        }
    }

    reader.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Event, RoundState};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_connect_and_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, mut incoming_rx) = mpsc::unbounded_channel();
        let connection =
            tokio::spawn(async move { run_connection(&addr, outgoing_rx, incoming_tx).await });

        let (mut server_side, _) = listener.accept().await.unwrap();
        match read_packet(&mut server_side).await.unwrap() {
            Some(Packet::Connect { client_version }) => assert_eq!(client_version, PROTOCOL_VERSION),
            other => panic!("Unexpected packet: {:?}", other),
        }

        write_packet(
            &mut server_side,
            &Packet::Welcome {
                participant: 3,
                last_seq: 0,
                snapshot: RoundState::new(),
            },
        )
        .await
        .unwrap();

        let event = timeout(Duration::from_secs(2), incoming_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            event,
            NetworkEvent::Received(Packet::Welcome { participant: 3, .. })
        ));

        outgoing_tx
            .send(Packet::Request {
                event: Event::Press {
                    participant: 3,
                    token: 0,
                },
            })
            .unwrap();
        outgoing_tx.send(Packet::Disconnect).unwrap();

        assert!(matches!(
            read_packet(&mut server_side).await.unwrap(),
            Some(Packet::Request { .. })
        ));
        assert!(matches!(
            read_packet(&mut server_side).await.unwrap(),
            Some(Packet::Disconnect)
        ));

        timeout(Duration::from_secs(2), connection)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_server_close_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (_outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, mut incoming_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move { run_connection(&addr, outgoing_rx, incoming_tx).await });

        let (mut server_side, _) = listener.accept().await.unwrap();
        assert!(read_packet(&mut server_side).await.unwrap().is_some());
        drop(server_side);

        let event = timeout(Duration::from_secs(2), incoming_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, NetworkEvent::Closed(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let (_outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, _incoming_rx) = mpsc::unbounded_channel();
        assert!(run_connection(&addr, outgoing_rx, incoming_tx).await.is_err());
    }
}

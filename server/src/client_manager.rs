//! Connection roster for the host.
//!
//! This module tracks every open peer connection:
//! - Accepted sockets that have not sent `Connect` yet
//! - Registered participants and the queue feeding their writer task
//! - Capacity limits and address lookup for incoming packets
//!
//! Each connection owns one unbounded queue drained by a single writer
//! task, so packets reach a given peer in exactly the order they were queued.

use log::{info, warn};
use shared::{Packet, ParticipantId};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc::UnboundedSender;

/// A registered peer connection
#[derive(Debug)]
pub struct Client {
    /// Participant identifier assigned by the authority
    pub id: ParticipantId,
    /// Remote address of the connection
    pub addr: SocketAddr,
    outbound: UnboundedSender<Packet>,
}

impl Client {
    pub fn new(id: ParticipantId, addr: SocketAddr, outbound: UnboundedSender<Packet>) -> Self {
        Self {
            id,
            addr,
            outbound,
        }
    }

    /// Queues a packet for this peer. False once its writer has gone away.
    pub fn send(&self, packet: Packet) -> bool {
        self.outbound.send(packet).is_ok()
    }
}

/// Tracks open connections and routes outbound packets to them
pub struct ClientManager {
    /// Registered participants indexed by their ID
    clients: HashMap<ParticipantId, Client>,
    /// Accepted connections still waiting for their `Connect`
    pending: HashMap<SocketAddr, UnboundedSender<Packet>>,
    /// Maximum number of registered participants
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            pending: HashMap::new(),
            max_clients,
        }
    }

    /// Remembers a freshly accepted connection until it introduces itself
    pub fn accept(&mut self, addr: SocketAddr, outbound: UnboundedSender<Packet>) {
        info!("Connection accepted from {}", addr);
        self.pending.insert(addr, outbound);
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Promotes a pending connection to a registered participant
    ///
    /// Returns false if the address is unknown or the roster is full.
    pub fn register(&mut self, addr: SocketAddr, id: ParticipantId) -> bool {
        if self.is_full() {
            return false;
        }
        match self.pending.remove(&addr) {
            Some(outbound) => {
                info!("Participant {} registered from {}", id, addr);
                self.clients.insert(id, Client::new(id, addr, outbound));
                true
            }
            None => false,
        }
    }

    /// Removes a participant. Its writer task ends once the queue is dropped.
    pub fn remove_client(&mut self, id: &ParticipantId) -> bool {
        if let Some(client) = self.clients.remove(id) {
            info!("Participant {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    /// Forgets a closed connection, returning its participant if it had one
    pub fn drop_connection(&mut self, addr: SocketAddr) -> Option<ParticipantId> {
        if self.pending.remove(&addr).is_some() {
            return None;
        }
        let id = self.find_client_by_addr(addr)?;
        self.remove_client(&id);
        Some(id)
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<ParticipantId> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    pub fn send_to(&self, id: ParticipantId, packet: Packet) -> bool {
        match self.clients.get(&id) {
            Some(client) => client.send(packet),
            None => {
                warn!("No connection for participant {}", id);
                false
            }
        }
    }

    /// Answers a connection that never became a participant
    pub fn send_to_pending(&self, addr: SocketAddr, packet: Packet) -> bool {
        self.pending
            .get(&addr)
            .map(|outbound| outbound.send(packet).is_ok())
            .unwrap_or(false)
    }

    /// Queues `packet` for every registered participant
    pub fn broadcast(&self, packet: &Packet) {
        for client in self.clients.values() {
            if !client.send(packet.clone()) {
                warn!("Writer for participant {} is gone", client.id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

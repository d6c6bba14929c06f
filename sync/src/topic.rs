//! Broadcast topics and peer endpoints.

use pagegraph_core::PeerId;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use tracing::{trace, warn};

use crate::error::{SyncError, SyncResult};
use crate::message::{Envelope, SyncMessage};

/// Something primitives can fan their operation descriptors out to.
///
/// `skip` names a peer that must not receive this message (the peer the
/// operation was just received from), on top of the publisher itself.
pub trait Broadcast {
    /// Id this publisher stamps on its envelopes.
    fn peer_id(&self) -> &PeerId;

    /// Fan a message out. Returns how many peers it was queued for.
    fn publish(&self, message: &SyncMessage, skip: Option<&PeerId>) -> usize;
}

type Members = BTreeMap<PeerId, Sender<String>>;

/// A named message bus connecting the peers of one editing session.
///
/// Delivery is ordered per sender and at-least-once: nothing is dropped while
/// the receiving endpoint is alive.
#[derive(Debug, Clone)]
pub struct SyncTopic {
    name: Arc<str>,
    members: Arc<Mutex<Members>>,
    /// Shared across members so a peer that rejoins never reuses a number.
    seq: Arc<AtomicU64>,
}

impl SyncTopic {
    /// Create a topic with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            members: Arc::new(Mutex::new(Members::new())),
            seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Topic name (the session id).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a peer and hand back its endpoint.
    pub fn join(&self, peer_id: PeerId) -> SyncResult<PeerEndpoint> {
        let mut members = self.members.lock();
        if members.contains_key(&peer_id) {
            return Err(SyncError::peer_already_joined(self.name(), peer_id));
        }
        let (tx, rx) = mpsc::channel();
        members.insert(peer_id.clone(), tx);
        trace!(topic = %self.name, peer = %peer_id, "peer joined");
        Ok(PeerEndpoint {
            peer_id,
            topic: self.clone(),
            inbox: rx,
        })
    }

    /// Ids of every peer currently on the topic.
    pub fn members(&self) -> Vec<PeerId> {
        self.members.lock().keys().cloned().collect()
    }

    fn leave(&self, peer_id: &PeerId) {
        if self.members.lock().remove(peer_id).is_some() {
            trace!(topic = %self.name, peer = %peer_id, "peer left");
        }
    }

    /// Queue `payload` for every member except `sender` and `skip`.
    fn fan_out(&self, sender: &PeerId, skip: Option<&PeerId>, payload: &str) -> usize {
        let mut members = self.members.lock();
        let mut delivered = 0;
        let mut gone = Vec::new();
        for (peer, tx) in members.iter() {
            if peer == sender || Some(peer) == skip {
                continue;
            }
            match tx.send(payload.to_string()) {
                Ok(()) => delivered += 1,
                Err(_) => gone.push(peer.clone()),
            }
        }
        for peer in gone {
            warn!(topic = %self.name, peer = %peer, "dropping disconnected peer");
            members.remove(&peer);
        }
        delivered
    }

    fn send_to(&self, recipient: &PeerId, payload: String) -> SyncResult<()> {
        let members = self.members.lock();
        let tx = members
            .get(recipient)
            .ok_or_else(|| SyncError::unknown_peer(self.name(), recipient.clone()))?;
        tx.send(payload)
            .map_err(|_| SyncError::unknown_peer(self.name(), recipient.clone()))
    }
}

/// Registry of topics keyed by session id.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    topics: Mutex<HashMap<String, SyncTopic>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the topic for a session, creating it on first use.
    pub fn topic(&self, session_id: &str) -> SyncTopic {
        self.topics
            .lock()
            .entry(session_id.to_string())
            .or_insert_with(|| SyncTopic::new(session_id))
            .clone()
    }

    /// Drop a session's topic. Endpoints already joined keep working among
    /// themselves.
    pub fn close(&self, session_id: &str) -> bool {
        self.topics.lock().remove(session_id).is_some()
    }
}

/// One peer's membership in a topic: its inbox plus a handle to publish.
///
/// Leaving happens on drop.
#[derive(Debug)]
pub struct PeerEndpoint {
    peer_id: PeerId,
    topic: SyncTopic,
    inbox: Receiver<String>,
}

impl PeerEndpoint {
    /// The topic this endpoint is joined to.
    pub fn topic(&self) -> &SyncTopic {
        &self.topic
    }

    /// Send one message to one peer (used for the initial snapshot).
    pub fn send_to(&self, recipient: &PeerId, message: &SyncMessage) -> SyncResult<()> {
        let payload = self.stamp(message).encode()?;
        self.topic.send_to(recipient, payload)
    }

    /// Hand a received envelope on to every other peer except `skip`,
    /// keeping its origin and sequence number.
    pub fn forward(&self, envelope: &Envelope, skip: Option<&PeerId>) -> usize {
        let relayed = envelope.relayed_by(self.peer_id.clone());
        let payload = match relayed.encode() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(peer = %self.peer_id, op = envelope.message.op_name(), error = %err, "cannot encode message");
                return 0;
            }
        };
        let delivered = self.topic.fan_out(&self.peer_id, skip, &payload);
        trace!(
            peer = %self.peer_id,
            origin = %envelope.origin,
            seq = envelope.seq,
            delivered,
            "forwarded"
        );
        delivered
    }

    fn stamp(&self, message: &SyncMessage) -> Envelope {
        let seq = self.topic.seq.fetch_add(1, Ordering::Relaxed);
        Envelope::new(self.peer_id.clone(), seq, message.clone())
    }

    /// Take the next queued message, if any. A payload that fails to parse
    /// comes back as an error and is consumed.
    pub fn try_recv(&self) -> Option<SyncResult<Envelope>> {
        match self.inbox.try_recv() {
            Ok(raw) => Some(Envelope::decode(&raw)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take everything queued right now, in arrival order.
    pub fn drain(&self) -> Vec<SyncResult<Envelope>> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Queue a raw, already-encoded payload for every other peer. Exposed so
    /// hosts can forward frames they did not produce.
    pub fn publish_raw(&self, payload: &str, skip: Option<&PeerId>) -> usize {
        self.topic.fan_out(&self.peer_id, skip, payload)
    }
}

impl Broadcast for PeerEndpoint {
    fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    fn publish(&self, message: &SyncMessage, skip: Option<&PeerId>) -> usize {
        let payload = match self.stamp(message).encode() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(peer = %self.peer_id, op = message.op_name(), error = %err, "cannot encode message");
                return 0;
            }
        };
        let delivered = self.topic.fan_out(&self.peer_id, skip, &payload);
        trace!(
            peer = %self.peer_id,
            op = message.op_name(),
            delivered,
            "fanned out"
        );
        delivered
    }
}

impl Drop for PeerEndpoint {
    fn drop(&mut self) {
        self.topic.leave(&self.peer_id);
    }
}

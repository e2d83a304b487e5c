//! Per-channel mailboxes with a per-message time-to-live.

use std::{
    collections::{BTreeMap, VecDeque},
    time::{Duration, Instant},
};

use runtag_core::{Camp, EntityId};
use tracing::debug;

/// A delivered radio message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message<P> {
    /// Operator that sent the message.
    pub sender: EntityId,
    /// Transported payload.
    pub payload: P,
    /// Operator the message is addressed to.
    pub receiver: EntityId,
}

#[derive(Clone, Debug)]
struct Envelope<P> {
    message: Message<P>,
    sent_at: Instant,
}

impl<P> Envelope<P> {
    fn expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.sent_at) >= ttl
    }

    fn matches(&self, sender: Option<EntityId>, receiver: Option<EntityId>) -> bool {
        sender.map_or(true, |sender| sender == self.message.sender)
            && receiver.map_or(true, |receiver| receiver == self.message.receiver)
    }
}

/// Mailbox shared by all radios tuned to one channel.
///
/// Messages are delivered in send order and each message is handed out at
/// most once. A message that has been pending for `ttl` or longer is
/// discarded on the next send or receive.
#[derive(Clone, Debug)]
pub struct Station<P> {
    channel: Camp,
    ttl: Duration,
    envelopes: VecDeque<Envelope<P>>,
}

impl<P> Station<P> {
    /// Creates an empty mailbox for `channel`.
    #[must_use]
    pub fn new(channel: Camp, ttl: Duration) -> Self {
        Self {
            channel,
            ttl,
            envelopes: VecDeque::new(),
        }
    }

    /// Channel the mailbox serves.
    #[must_use]
    pub const fn channel(&self) -> Camp {
        self.channel
    }

    /// Lifetime of an undelivered message.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of messages still held, including expired ones not yet discarded.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.envelopes.len()
    }

    /// Enqueues a message stamped with `now`.
    pub fn send(&mut self, sender: EntityId, payload: P, receiver: EntityId, now: Instant) {
        self.discard_expired(now);
        self.envelopes.push_back(Envelope {
            message: Message {
                sender,
                payload,
                receiver,
            },
            sent_at: now,
        });
    }

    /// Removes and returns up to `count` live messages matching the filters.
    ///
    /// A `None` filter matches every sender or receiver. A `count` of zero
    /// means no limit. Unmatched messages keep their place in the queue.
    pub fn receive(
        &mut self,
        sender: Option<EntityId>,
        receiver: Option<EntityId>,
        count: usize,
        now: Instant,
    ) -> Vec<Message<P>> {
        self.discard_expired(now);

        let mut received = Vec::new();
        let mut kept = VecDeque::with_capacity(self.envelopes.len());
        for envelope in self.envelopes.drain(..) {
            let wanted = count == 0 || received.len() < count;
            if wanted && envelope.matches(sender, receiver) {
                received.push(envelope.message);
            } else {
                kept.push_back(envelope);
            }
        }
        self.envelopes = kept;
        received
    }

    /// Drops every message whose time-to-live has elapsed at `now`.
    pub fn discard_expired(&mut self, now: Instant) {
        let ttl = self.ttl();
        let before = self.envelopes.len();
        self.envelopes.retain(|envelope| !envelope.expired(ttl, now));
        let expired = before - self.envelopes.len();
        if expired > 0 {
            debug!(channel = %self.channel, expired, ?ttl, "mailbox expired messages");
        }
    }
}

/// Mailboxes of one game, one per channel, created on first use.
#[derive(Clone, Debug)]
pub struct Stations<P> {
    ttl: Duration,
    channels: BTreeMap<Camp, Station<P>>,
}

impl<P> Stations<P> {
    /// Creates an empty registry whose mailboxes expire messages after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            channels: BTreeMap::new(),
        }
    }

    /// Mailbox of `channel`, created if it does not exist yet.
    pub fn tune(&mut self, channel: Camp) -> &mut Station<P> {
        let ttl = self.ttl;
        self.channels
            .entry(channel)
            .or_insert_with(|| Station::new(channel, ttl))
    }

    /// Mailbox of `channel`, if any radio has used it.
    #[must_use]
    pub fn get(&self, channel: Camp) -> Option<&Station<P>> {
        self.channels.get(&channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(5);

    fn id(value: u32) -> EntityId {
        EntityId::new(value)
    }

    #[test]
    fn messages_are_delivered_in_send_order() {
        let mut station = Station::new(Camp::Blue, TTL);
        let now = Instant::now();
        station.send(id(0), "first", id(1), now);
        station.send(id(0), "second", id(1), now);
        station.send(id(0), "third", id(1), now);

        let payloads: Vec<_> = station
            .receive(None, Some(id(1)), 2, now)
            .into_iter()
            .map(|message| message.payload)
            .collect();
        assert_eq!(payloads, vec!["first", "second"]);
        assert_eq!(station.pending(), 1);
    }

    #[test]
    fn unmatched_messages_keep_their_place() {
        let mut station = Station::new(Camp::Red, TTL);
        let now = Instant::now();
        station.send(id(0), 1, id(2), now);
        station.send(id(0), 2, id(3), now);
        station.send(id(0), 3, id(2), now);

        let for_three = station.receive(None, Some(id(3)), 0, now);
        assert_eq!(for_three.len(), 1);
        let for_two: Vec<_> = station
            .receive(Some(id(0)), Some(id(2)), 0, now)
            .into_iter()
            .map(|message| message.payload)
            .collect();
        assert_eq!(for_two, vec![1, 3]);
    }

    #[test]
    fn stations_are_created_lazily_per_channel() {
        let mut stations: Stations<u8> = Stations::new(TTL);
        assert!(stations.get(Camp::Blue).is_none());
        stations.tune(Camp::Blue).send(id(0), 7, id(1), Instant::now());
        assert_eq!(stations.get(Camp::Blue).map(Station::pending), Some(1));
        assert!(stations.get(Camp::Red).is_none());
        assert_eq!(stations.tune(Camp::Red).channel(), Camp::Red);
        assert_eq!(stations.tune(Camp::Red).ttl(), TTL, "registry ttl is inherited");
    }
}

use std::time::Duration;

use tracing::{debug, warn};

use serbus_frame::{
    write_ack_frame, write_frame, Checksum, Crc16, Decoder, FrameInfo, Inbound, Status,
    MAX_PAYLOAD, MAX_TOPIC,
};
use serbus_link::SerialLink;

use crate::clock::{Clock, MonotonicClock};
use crate::error::{NodeError, Result};
use crate::registry::{TopicHandler, TopicRegistry};

/// Delivery confirmation mode for [`Node::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// Fire and forget: return as soon as the frame is on the wire.
    None,
    /// Block until the peer acknowledges or the deadline passes.
    Required(Duration),
}

impl AckMode {
    /// Default acknowledgment deadline.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

    /// Confirmation with the default deadline.
    pub fn required() -> Self {
        Self::Required(Self::DEFAULT_TIMEOUT)
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Number of topic registry slots.
    pub max_topics: usize,
}

impl NodeConfig {
    /// Default registry capacity.
    pub const DEFAULT_MAX_TOPICS: usize = 10;
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            max_topics: Self::DEFAULT_MAX_TOPICS,
        }
    }
}

/// A point-to-point publish/subscribe endpoint on one serial link.
///
/// The node is single-owner and fully synchronous: [`Node::poll`] drains
/// whatever bytes the link has buffered and dispatches completed frames to
/// their subscribers; [`Node::publish`] writes one frame and, when
/// confirmation is requested, keeps polling until the acknowledgment
/// arrives or the deadline passes. Unrelated inbound frames are dispatched
/// normally while a publish waits — confirmation never pauses reception.
pub struct Node<L: SerialLink, C: Checksum = Crc16> {
    link: L,
    registry: TopicRegistry,
    decoder: Decoder<C>,
    tx_crc: C,
    clock: Box<dyn Clock>,
    /// Status carried by the last valid acknowledgment, if one arrived
    /// since the latch was last cleared.
    ack_status: Option<Status>,
    dropped_frames: u64,
}

impl<L: SerialLink> Node<L> {
    /// Create a node with default configuration and CRC-16/CCITT checksums.
    pub fn new(link: L) -> Self {
        Self::with_config(link, NodeConfig::default())
    }

    /// Create a node with explicit configuration.
    pub fn with_config(link: L, config: NodeConfig) -> Self {
        Self::with_checksums(link, config, Crc16::new(), Crc16::new())
    }
}

impl<L: SerialLink, C: Checksum> Node<L, C> {
    /// Create a node around explicit checksum engines (transmit, receive).
    /// Both ends of the line must run the same engine.
    pub fn with_checksums(link: L, config: NodeConfig, tx_crc: C, rx_crc: C) -> Self {
        Self {
            link,
            registry: TopicRegistry::with_capacity(config.max_topics),
            decoder: Decoder::with_checksum(rx_crc),
            tx_crc,
            clock: Box::new(MonotonicClock::new()),
            ack_status: None,
            dropped_frames: 0,
        }
    }

    /// Replace the time source used for acknowledgment deadlines.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Register a handler for a topic (ids 0-62, one handler per topic).
    ///
    /// The handler borrows its payload only for the duration of the call;
    /// copy out anything that must outlive it. The returned status is sent
    /// back as the acknowledgment when the publisher asked for one.
    pub fn subscribe<F>(&mut self, topic: u8, handler: F) -> Result<()>
    where
        F: FnMut(u8, &[u8], Status) -> Status + Send + 'static,
    {
        self.registry.subscribe(topic, Box::new(handler) as TopicHandler)
    }

    /// Remove the handler for a topic.
    pub fn unsubscribe(&mut self, topic: u8) -> Result<()> {
        self.registry.unsubscribe(topic)
    }

    /// Publish a payload on a topic.
    ///
    /// With [`AckMode::None`] this returns `Ok(Status::Ok)` once the bytes
    /// are handed to the link — no delivery guarantee. With
    /// [`AckMode::Required`] it blocks, pumping inbound frames, until a
    /// valid acknowledgment arrives (returning the status the remote
    /// handler produced) or the deadline passes
    /// ([`NodeError::AckTimeout`]). Retry policy belongs to the caller.
    pub fn publish(&mut self, topic: u8, payload: &[u8], ack: AckMode) -> Result<Status> {
        if topic > MAX_TOPIC {
            return Err(NodeError::TopicOutOfRange(topic));
        }
        if payload.len() > MAX_PAYLOAD {
            return Err(NodeError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        let info = FrameInfo::data(topic, matches!(ack, AckMode::Required(_)));
        write_frame(&mut self.link, &mut self.tx_crc, info, payload)?;

        match ack {
            AckMode::None => Ok(Status::Ok),
            AckMode::Required(timeout) => self.wait_for_ack(timeout),
        }
    }

    /// Drain currently available bytes through the decoder, dispatching
    /// every completed frame. Never blocks.
    pub fn poll(&mut self) -> Result<()> {
        while self.link.bytes_available()? > 0 {
            let byte = self.link.read_byte()?;
            if let Some(inbound) = self.decoder.push(byte) {
                self.dispatch(inbound)?;
            }
        }
        Ok(())
    }

    /// Inbound frames dropped because no subscriber matched their topic.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// Number of active subscriptions.
    pub fn subscriptions(&self) -> usize {
        self.registry.len()
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &L {
        &self.link
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Consume the node and return the link.
    pub fn into_inner(self) -> L {
        self.link
    }

    /// Route one completed frame.
    ///
    /// Acks feed the latch the wait loop watches; data frames go to their
    /// subscriber. A checksum failure still reaches the subscriber (as its
    /// status argument) but is never acknowledged — the publisher's
    /// timeout is the only failure signal on the wire.
    fn dispatch(&mut self, inbound: Inbound) -> Result<()> {
        if inbound.info.is_ack {
            if inbound.crc_ok {
                let status = inbound
                    .payload
                    .first()
                    .map(|&byte| Status::from_wire(byte))
                    .unwrap_or(Status::Rejected);
                self.ack_status = Some(status);
            } else {
                debug!("discarding acknowledgment with bad checksum");
            }
            return Ok(());
        }

        let topic = inbound.info.topic;
        let Some(subscription) = self.registry.lookup_mut(topic) else {
            self.dropped_frames += 1;
            debug!(topic, "dropping frame for unsubscribed topic");
            return Ok(());
        };

        let rx_status = if inbound.crc_ok {
            Status::Ok
        } else {
            warn!(topic, "checksum mismatch on inbound frame");
            Status::ChecksumMismatch
        };

        let reply = (subscription.handler)(topic, inbound.payload.as_ref(), rx_status);

        if inbound.crc_ok && inbound.info.ack_requested {
            write_ack_frame(&mut self.link, &mut self.tx_crc, reply)?;
        }
        Ok(())
    }

    /// Block until a valid acknowledgment arrives or the deadline passes.
    ///
    /// There is no correlation id: any valid ack observed here answers the
    /// outstanding publish. Sound because publishes are synchronous — at
    /// most one confirmation is ever pending.
    fn wait_for_ack(&mut self, timeout: Duration) -> Result<Status> {
        self.ack_status = None;
        let started = self.clock.now();

        loop {
            self.poll()?;
            if let Some(status) = self.ack_status.take() {
                return Ok(status);
            }
            if self.clock.now().duration_since(started) >= timeout {
                return Err(NodeError::AckTimeout(timeout));
            }
            self.clock.yield_now();
        }
    }
}

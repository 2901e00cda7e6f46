use serbus_frame::{Status, MAX_TOPIC};

use crate::error::{NodeError, Result};

/// A subscriber callback.
///
/// Invoked with the topic id, a borrowed payload valid only for the
/// duration of the call, and the inbound delivery status. The returned
/// status becomes the acknowledgment payload when the sender asked for
/// one, so returning [`Status::Rejected`] tells the remote publisher the
/// application refused the message.
pub type TopicHandler = Box<dyn FnMut(u8, &[u8], Status) -> Status + Send>;

pub(crate) struct Subscription {
    pub(crate) topic: u8,
    pub(crate) handler: TopicHandler,
}

/// Fixed-capacity map from topic id to subscriber.
///
/// Slots are claimed first-free on subscribe and reused lazily after
/// unsubscribe; there is no compaction. At most one subscriber per topic.
pub struct TopicRegistry {
    slots: Vec<Option<Subscription>>,
}

impl TopicRegistry {
    /// Create a registry with a fixed number of slots.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots }
    }

    /// Register a handler for a topic.
    pub fn subscribe(&mut self, topic: u8, handler: TopicHandler) -> Result<()> {
        if topic > MAX_TOPIC {
            return Err(NodeError::TopicOutOfRange(topic));
        }
        if self.lookup(topic).is_some() {
            return Err(NodeError::AlreadySubscribed(topic));
        }
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(free) => {
                *free = Some(Subscription { topic, handler });
                Ok(())
            }
            None => Err(NodeError::RegistryFull {
                capacity: self.slots.len(),
            }),
        }
    }

    /// Remove the handler for a topic.
    pub fn unsubscribe(&mut self, topic: u8) -> Result<()> {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|sub| sub.topic == topic) {
                *slot = None;
                return Ok(());
            }
        }
        Err(NodeError::NotSubscribed(topic))
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// True if nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    /// Total slot capacity.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn lookup(&self, topic: u8) -> Option<&Subscription> {
        self.slots
            .iter()
            .flatten()
            .find(|sub| sub.topic == topic)
    }

    pub(crate) fn lookup_mut(&mut self, topic: u8) -> Option<&mut Subscription> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|sub| sub.topic == topic)
    }
}

impl std::fmt::Debug for TopicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicRegistry")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

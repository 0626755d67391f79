use super::Topic;
use crate::api::error::{ErrorKind, Result};
use crate::util::FAILED_TO_LOCK;
use log::error;
use std::collections::{BTreeSet, HashMap};
use std::iter::FromIterator;
use std::sync::{Arc, Mutex};

/// One topic this node subscribes to, with the publisher slave URIs it
/// currently knows about.
#[derive(Clone, Debug)]
pub struct Subscription {
    pub topic: Topic,
    publishers: BTreeSet<String>,
}

#[derive(Clone, Debug, Default)]
pub struct SubscriptionsTracker {
    mapping: Arc<Mutex<HashMap<String, Subscription>>>,
}

impl SubscriptionsTracker {
    pub fn add(&self, topic: &str, msg_type: &str) -> Result<()> {
        use std::collections::hash_map::Entry;
        match self
            .mapping
            .lock()
            .expect(FAILED_TO_LOCK)
            .entry(String::from(topic))
        {
            Entry::Occupied(..) => {
                error!("Duplicate subscription to topic '{}' attempted", topic);
                Err(ErrorKind::Duplicate("subscription".into()).into())
            }
            Entry::Vacant(entry) => {
                entry.insert(Subscription {
                    topic: Topic {
                        name: String::from(topic),
                        msg_type: String::from(msg_type),
                    },
                    publishers: BTreeSet::new(),
                });
                Ok(())
            }
        }
    }

    #[inline]
    pub fn remove(&self, topic: &str) -> bool {
        self.mapping
            .lock()
            .expect(FAILED_TO_LOCK)
            .remove(topic)
            .is_some()
    }

    #[inline]
    pub fn get_topics<T: FromIterator<Topic>>(&self) -> T {
        self.mapping
            .lock()
            .expect(FAILED_TO_LOCK)
            .values()
            .map(|subscription| subscription.topic.clone())
            .collect()
    }

    #[inline]
    pub fn publisher_count(&self, topic: &str) -> usize {
        self.mapping
            .lock()
            .expect(FAILED_TO_LOCK)
            .get(topic)
            .map_or(0, |subscription| subscription.publishers.len())
    }

    #[inline]
    pub fn publisher_uris(&self, topic: &str) -> Vec<String> {
        self.mapping
            .lock()
            .expect(FAILED_TO_LOCK)
            .get(topic)
            .map_or_else(Vec::new, |subscription| {
                subscription.publishers.iter().cloned().collect()
            })
    }

    /// Replaces the known publisher set for a topic.
    ///
    /// The update is a replacement, not a merge: publishers absent from the
    /// new list are dropped. Returns which URIs appeared and which vanished
    /// so the data transport can connect and disconnect accordingly, or
    /// `None` if this node has no subscription for the topic.
    pub fn update_publishers(
        &self,
        topic: &str,
        publishers: &BTreeSet<String>,
    ) -> Option<(Vec<String>, Vec<String>)> {
        let mut mapping = self.mapping.lock().expect(FAILED_TO_LOCK);
        let subscription = mapping.get_mut(topic)?;
        let appeared = publishers
            .difference(&subscription.publishers)
            .cloned()
            .collect();
        let vanished = subscription
            .publishers
            .difference(publishers)
            .cloned()
            .collect();
        subscription.publishers = publishers.clone();
        Some((appeared, vanished))
    }
}

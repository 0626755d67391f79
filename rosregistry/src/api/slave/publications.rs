use super::Topic;
use crate::api::error::{ErrorKind, Result};
use crate::util::FAILED_TO_LOCK;
use log::error;
use std::collections::HashMap;
use std::iter::FromIterator;
use std::sync::{Arc, Mutex};

/// One topic this node publishes, with the port its data transport
/// listens on. The transport itself lives outside this crate; the port is
/// what `requestTopic` hands to interested subscribers.
#[derive(Clone, Debug)]
pub struct Publication {
    pub topic: Topic,
    pub port: u16,
}

#[derive(Clone, Debug, Default)]
pub struct PublicationsTracker {
    mapping: Arc<Mutex<HashMap<String, Publication>>>,
}

impl PublicationsTracker {
    pub fn add(&self, topic: &str, msg_type: &str, port: u16) -> Result<()> {
        use std::collections::hash_map::Entry;
        match self
            .mapping
            .lock()
            .expect(FAILED_TO_LOCK)
            .entry(String::from(topic))
        {
            Entry::Occupied(..) => {
                error!("Duplicate initiation of publication '{}' attempted", topic);
                Err(ErrorKind::Duplicate("publication".into()).into())
            }
            Entry::Vacant(entry) => {
                entry.insert(Publication {
                    topic: Topic {
                        name: String::from(topic),
                        msg_type: String::from(msg_type),
                    },
                    port,
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
            .map(|publication| publication.topic.clone())
            .collect()
    }

    #[inline]
    pub fn get_port(&self, topic: &str) -> Option<i32> {
        self.mapping
            .lock()
            .expect(FAILED_TO_LOCK)
            .get(topic)
            .map(|publication| i32::from(publication.port))
    }
}

pub use self::master::{MasterClient, SystemState, TopicData};
pub use self::slave::SlaveClient;

mod master;
mod slave;

use crate::api::slave::Topic;
use serde_derive::Deserialize;

#[derive(Debug, Deserialize)]
struct TopicTuple(String, String);

impl From<TopicTuple> for Topic {
    fn from(src: TopicTuple) -> Topic {
        Topic {
            name: src.0,
            msg_type: src.1,
        }
    }
}

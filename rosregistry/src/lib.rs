#![recursion_limit = "1024"]

pub use crate::api::client::{MasterClient, SlaveClient, SystemState, TopicData};
pub use crate::api::error;
pub use crate::api::{Master, Node, ServerState, Slave, Topic};
pub use crate::rosxmlrpc::{Response, ResponseError};
pub use ros_names::{GraphName, NameResolver, NodeNameResolver};

pub mod api;
pub mod rosxmlrpc;
mod util;

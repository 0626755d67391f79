use super::TopicTuple;
use crate::api::error::Result;
use crate::api::slave::Topic;
use crate::rosxmlrpc::{self, Response};
use serde_derive::Deserialize;

/// Synchronous stub for the master's registration API.
///
/// Every wire call carries the caller's node name first and, where the
/// protocol asks for it, the caller's slave URI last.
#[derive(Debug)]
pub struct MasterClient {
    client: rosxmlrpc::Client,
    caller_id: String,
    caller_api: String,
}

macro_rules! request {
    ($s:expr; $name:ident; $($item:expr),*) => ({
        $s.client.request(stringify!($name), &(&$s.caller_id,
            $(
                $item,
            )*
            ))
    })
}

impl MasterClient {
    pub fn new(master_uri: &str, caller_id: &str, caller_api: &str) -> Result<MasterClient> {
        Ok(MasterClient {
            client: rosxmlrpc::Client::new(master_uri)?,
            caller_id: caller_id.to_owned(),
            caller_api: caller_api.to_owned(),
        })
    }

    pub fn register_service(&self, service: &str, service_api: &str) -> Response<i32> {
        request!(self; registerService; service, service_api, &self.caller_api)
    }

    pub fn unregister_service(&self, service: &str, service_api: &str) -> Response<i32> {
        request!(self; unregisterService; service, service_api)
    }

    pub fn register_subscriber(&self, topic: &str, topic_type: &str) -> Response<Vec<String>> {
        request!(self; registerSubscriber; topic, topic_type, &self.caller_api)
    }

    pub fn unregister_subscriber(&self, topic: &str) -> Response<i32> {
        request!(self; unregisterSubscriber; topic, &self.caller_api)
    }

    pub fn register_publisher(&self, topic: &str, topic_type: &str) -> Response<Vec<String>> {
        request!(self; registerPublisher; topic, topic_type, &self.caller_api)
    }

    pub fn unregister_publisher(&self, topic: &str) -> Response<i32> {
        request!(self; unregisterPublisher; topic, &self.caller_api)
    }

    pub fn lookup_node(&self, node_name: &str) -> Response<String> {
        request!(self; lookupNode; node_name)
    }

    pub fn lookup_service(&self, service: &str) -> Response<String> {
        request!(self; lookupService; service)
    }

    pub fn get_published_topics(&self, subgraph: &str) -> Response<Vec<Topic>> {
        let topics: Vec<TopicTuple> = request!(self; getPublishedTopics; subgraph)?;
        Ok(topics.into_iter().map(Into::into).collect())
    }

    pub fn get_topic_types(&self) -> Response<Vec<Topic>> {
        let topics: Vec<TopicTuple> = request!(self; getTopicTypes;)?;
        Ok(topics.into_iter().map(Into::into).collect())
    }

    pub fn get_system_state(&self) -> Response<SystemState> {
        let state: SystemStateTuple = request!(self; getSystemState;)?;
        Ok(state.into())
    }

    pub fn get_uri(&self) -> Response<String> {
        request!(self; getUri;)
    }
}

/// Names of the nodes participating in one topic or service.
#[derive(Debug)]
pub struct TopicData {
    pub name: String,
    pub connections: Vec<String>,
}

/// The master's view of the whole graph.
#[derive(Debug)]
pub struct SystemState {
    pub publishers: Vec<TopicData>,
    pub subscribers: Vec<TopicData>,
    pub services: Vec<TopicData>,
}

#[derive(Debug, Deserialize)]
struct TopicDataTuple(String, Vec<String>);

#[derive(Debug, Deserialize)]
struct SystemStateTuple(
    Vec<TopicDataTuple>,
    Vec<TopicDataTuple>,
    Vec<TopicDataTuple>,
);

impl From<SystemStateTuple> for SystemState {
    fn from(src: SystemStateTuple) -> SystemState {
        SystemState {
            publishers: src.0.into_iter().map(Into::into).collect(),
            subscribers: src.1.into_iter().map(Into::into).collect(),
            services: src.2.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<TopicDataTuple> for TopicData {
    fn from(src: TopicDataTuple) -> TopicData {
        TopicData {
            name: src.0,
            connections: src.1,
        }
    }
}


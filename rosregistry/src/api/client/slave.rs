use super::TopicTuple;
use crate::api::error::Result;
use crate::api::slave::Topic;
use crate::rosxmlrpc::{self, Response};
use serde_derive::Deserialize;

/// Synchronous stub for a peer node's slave API.
///
/// Used by the master for publisher updates and replacement shutdowns, and
/// by subscriber nodes to negotiate a transport with a publisher.
pub struct SlaveClient {
    client: rosxmlrpc::Client,
    caller_id: String,
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

impl SlaveClient {
    pub fn new(slave_uri: &str, caller_id: &str) -> Result<SlaveClient> {
        Ok(SlaveClient {
            client: rosxmlrpc::Client::new(slave_uri)?,
            caller_id: caller_id.to_owned(),
        })
    }

    pub fn get_master_uri(&self) -> Response<String> {
        request!(self; getMasterUri;)
    }

    pub fn get_pid(&self) -> Response<i32> {
        request!(self; getPid;)
    }

    pub fn get_subscriptions(&self) -> Response<Vec<Topic>> {
        let topics: Vec<TopicTuple> = request!(self; getSubscriptions;)?;
        Ok(topics.into_iter().map(Into::into).collect())
    }

    pub fn get_publications(&self) -> Response<Vec<Topic>> {
        let topics: Vec<TopicTuple> = request!(self; getPublications;)?;
        Ok(topics.into_iter().map(Into::into).collect())
    }

    pub fn publisher_update(&self, topic: &str, publishers: &[String]) -> Response<i32> {
        request!(self; publisherUpdate; topic, publishers)
    }

    /// Negotiates the transport for a topic published by this slave.
    ///
    /// Protocols are offered in preference order; the returned descriptor
    /// names the chosen protocol and its endpoint.
    pub fn request_topic(
        &self,
        topic: &str,
        protocols: &[&str],
    ) -> Response<(String, String, i32)> {
        let protocols: Vec<[&str; 1]> = protocols.iter().map(|name| [*name]).collect();
        let descriptor: ProtocolDescriptorTuple = request!(self; requestTopic; topic, protocols)?;
        Ok((descriptor.0, descriptor.1, descriptor.2))
    }

    pub fn shutdown(&self, message: &str) -> Response<i32> {
        request!(self; shutdown; message)
    }
}

#[derive(Debug, Deserialize)]
struct ProtocolDescriptorTuple(String, String, i32);

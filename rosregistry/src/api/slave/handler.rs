use super::publications::PublicationsTracker;
use super::subscriptions::SubscriptionsTracker;
use super::ServerState;
use crate::rosxmlrpc::{self, Response, ResponseError, Server};
use crate::util::{kill, FAILED_TO_LOCK};
use log::{debug, error, info};
use ros_names::GraphName;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use xml_rpc::{self, rouille, Params, Value};

/// Protocols this slave can serve topic data over, in preference order.
static SUPPORTED_PROTOCOLS: &[&str] = &["TCPROS"];

pub struct SlaveHandler {
    server: Server,
}

fn unwrap_array_case(params: Params) -> Params {
    if let Some(Value::Array(items)) = params.get(0) {
        return items.clone();
    }
    params
}

impl SlaveHandler {
    pub fn new(
        master_uri: &str,
        hostname: &str,
        state: Arc<Mutex<ServerState>>,
        shutdown_signal: kill::Sender,
        publications: PublicationsTracker,
        subscriptions: SubscriptionsTracker,
    ) -> SlaveHandler {
        let mut server = Server::default();

        server.register_value("getBusStats", "Bus stats", |_args| {
            Err(ResponseError::Server("Method not implemented".into()))
        });

        server.register_value("getBusInfo", "Bus info", |_args| {
            Err(ResponseError::Server("Method not implemented".into()))
        });

        let master_uri_string = String::from(master_uri);

        server.register_value("getMasterUri", "Master URI", move |_args| {
            Ok(Value::String(master_uri_string.clone()))
        });

        server.register_value("shutdown", "Shutdown", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let _caller_id = args
                .next()
                .ok_or_else(|| ResponseError::Client("Missing argument 'caller_id'".into()))?;
            let message = match args.next() {
                Some(Value::String(message)) => message,
                _ => return Err(ResponseError::Client("Missing argument 'message'".into())),
            };
            info!("Server is shutting down because: {}", message);
            *state.lock().expect(FAILED_TO_LOCK) = ServerState::ShuttingDown;
            match shutdown_signal.send() {
                Ok(()) => Ok(Value::Int(0)),
                Err(err) => {
                    error!("Shutdown error: {:?}", err);
                    Err(ResponseError::Server("Failed to shut down".into()))
                }
            }
        });

        server.register_value("getPid", "PID", |_args| {
            Ok(Value::Int(std::process::id() as i32))
        });

        let subs = subscriptions.clone();

        server.register_value("getSubscriptions", "List of subscriptions", move |_args| {
            Ok(Value::Array(
                subs.get_topics::<Vec<_>>()
                    .into_iter()
                    .map(|topic| {
                        Value::Array(vec![
                            Value::String(topic.name),
                            Value::String(topic.msg_type),
                        ])
                    })
                    .collect(),
            ))
        });

        let pubs = publications.clone();

        server.register_value("getPublications", "List of publications", move |_args| {
            Ok(Value::Array(
                pubs.get_topics::<Vec<_>>()
                    .into_iter()
                    .map(|topic| {
                        Value::Array(vec![
                            Value::String(topic.name),
                            Value::String(topic.msg_type),
                        ])
                    })
                    .collect(),
            ))
        });

        server.register_value("paramUpdate", "Parameter updated", |_args| {
            // This node keeps no parameter cache; acknowledge and move on.
            Ok(Value::Int(0))
        });

        let subs = subscriptions;

        server.register_value("publisherUpdate", "Publishers updated", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let _caller_id = args
                .next()
                .ok_or_else(|| ResponseError::Client("Missing argument 'caller_id'".into()))?;
            let topic = match args.next() {
                Some(Value::String(topic)) => topic,
                _ => return Err(ResponseError::Client("Missing argument 'topic'".into())),
            };
            let publishers = match args.next() {
                Some(Value::Array(publishers)) => publishers,
                _ => {
                    return Err(ResponseError::Client(
                        "Missing argument 'publishers'".into(),
                    ));
                }
            };
            let publishers = publishers
                .into_iter()
                .map(|value| match value {
                    Value::String(uri) => validate_publisher_uri(uri),
                    _ => Err(ResponseError::Client(
                        "Publishers need to be strings".into(),
                    )),
                })
                .collect::<Response<BTreeSet<String>>>()?;

            match subs.update_publishers(&topic, &publishers) {
                Some((appeared, vanished)) => {
                    for uri in appeared {
                        debug!("Topic {} gained publisher {}", topic, uri);
                    }
                    for uri in vanished {
                        debug!("Topic {} lost publisher {}", topic, uri);
                    }
                }
                None => debug!("Ignoring publisher update for unsubscribed topic {}", topic),
            }
            Ok(Value::Int(0))
        });

        let hostname_string = String::from(hostname);
        let pubs = publications;

        server.register_value("requestTopic", "Chosen protocol", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let _caller_id = args
                .next()
                .ok_or_else(|| ResponseError::Client("Missing argument 'caller_id'".into()))?;
            let topic = match args.next() {
                Some(Value::String(topic)) => topic,
                _ => return Err(ResponseError::Client("Missing argument 'topic'".into())),
            };
            let protocols = match args.next() {
                Some(Value::Array(protocols)) => protocols,
                Some(_) => {
                    return Err(ResponseError::Client(
                        "Protocols need to be provided as [ [String, XmlRpcLegalValue] ]".into(),
                    ));
                }
                None => return Err(ResponseError::Client("Missing argument 'protocols'".into())),
            };
            let topic = GraphName::new(topic)
                .map_err(|err| ResponseError::Client(format!("{}", err)))?
                .to_global();
            let port = pubs.get_port(topic.as_str()).ok_or_else(|| {
                ResponseError::Server(format!("No publishers for topic: {}", topic))
            })?;
            // First requested protocol this slave supports wins.
            for protocol in protocols {
                let name = match protocol {
                    Value::String(name) => Some(name),
                    Value::Array(description) => match description.into_iter().next() {
                        Some(Value::String(name)) => Some(name),
                        _ => None,
                    },
                    _ => None,
                };
                match name {
                    Some(ref name) if SUPPORTED_PROTOCOLS.contains(&name.as_str()) => {
                        return Ok(Value::Array(vec![
                            Value::String(name.clone()),
                            Value::String(hostname_string.clone()),
                            Value::Int(port),
                        ]));
                    }
                    _ => {}
                }
            }
            Err(ResponseError::Server(
                "No supported protocols specified".into(),
            ))
        });

        SlaveHandler { server }
    }

    pub fn bind(
        self,
        addr: &SocketAddr,
    ) -> rosxmlrpc::error::Result<
        xml_rpc::server::BoundServer<
            impl Fn(&rouille::Request) -> rouille::Response + Send + Sync + 'static,
        >,
    > {
        self.server.bind(addr).map_err(Into::into)
    }
}

// Publisher updates may only carry http(s) slave endpoints.
fn validate_publisher_uri(uri: String) -> Response<String> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        Ok(uri)
    } else {
        Err(ResponseError::Client(format!(
            "Publisher URI '{}' is not an http(s) endpoint",
            uri
        )))
    }
}

use super::registration::RegistrationManager;
use crate::api::client::SlaveClient;
use crate::api::master::MASTER_CALLER_ID;
use crate::rosxmlrpc::{self, Response, ResponseError, Server};
use crate::util::{kill, FAILED_TO_LOCK};
use log::{error, info};
use ros_names::GraphName;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;
use std::vec::IntoIter;
use xml_rpc::{self, rouille, Params, Value};

/// The master's XML-RPC endpoint.
///
/// Handlers only canonicalize arguments and shuttle data in and out of the
/// registration manager; every directory access takes the single manager
/// lock, and publisher update pushes happen after it is released.
pub struct MasterHandler {
    server: Server,
}

fn unwrap_array_case(params: Params) -> Params {
    if let Some(Value::Array(items)) = params.get(0) {
        return items.clone();
    }
    params
}

fn pop_string(args: &mut IntoIter<Value>, name: &str) -> Response<String> {
    match args.next() {
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(ResponseError::Client(format!(
            "Argument '{}' needs to be a string",
            name
        ))),
        None => Err(ResponseError::Client(format!(
            "Missing argument '{}'",
            name
        ))),
    }
}

// Raw strings come off the wire; everything entering the directory is a
// canonical global name.
fn pop_name(args: &mut IntoIter<Value>, name: &str) -> Response<GraphName> {
    let value = pop_string(args, name)?;
    GraphName::new(value)
        .map(|parsed| parsed.to_global())
        .map_err(|err| ResponseError::Client(format!("{}", err)))
}

impl MasterHandler {
    pub fn new(
        manager: Arc<Mutex<RegistrationManager>>,
        advertised_uri: Arc<Mutex<String>>,
        shutdown_signal: kill::Sender,
    ) -> MasterHandler {
        let mut server = Server::default();

        let directory = Arc::clone(&manager);

        server.register_value("registerPublisher", "Publisher registered", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let caller_id = pop_name(&mut args, "caller_id")?;
            let topic = pop_name(&mut args, "topic")?;
            let topic_type = pop_string(&mut args, "topic_type")?;
            let caller_api = pop_string(&mut args, "caller_api")?;
            let (publisher_uris, subscriber_uris) = {
                let mut directory = directory.lock().expect(FAILED_TO_LOCK);
                let info = directory.register_publisher(&caller_id, &caller_api, &topic, &topic_type);
                (
                    directory.node_uris(info.publishers()),
                    directory.node_uris(info.subscribers()),
                )
            };
            send_publisher_updates(&topic, &publisher_uris, &subscriber_uris);
            Ok(Value::Array(
                subscriber_uris.into_iter().map(Value::String).collect(),
            ))
        });

        let directory = Arc::clone(&manager);

        server.register_value("registerSubscriber", "Subscriber registered", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let caller_id = pop_name(&mut args, "caller_id")?;
            let topic = pop_name(&mut args, "topic")?;
            let topic_type = pop_string(&mut args, "topic_type")?;
            let caller_api = pop_string(&mut args, "caller_api")?;
            let mut directory = directory.lock().expect(FAILED_TO_LOCK);
            let info = directory.register_subscriber(&caller_id, &caller_api, &topic, &topic_type);
            let publisher_uris = directory.node_uris(info.publishers());
            Ok(Value::Array(
                publisher_uris.into_iter().map(Value::String).collect(),
            ))
        });

        let directory = Arc::clone(&manager);

        server.register_value("unregisterPublisher", "Publisher unregistered", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let caller_id = pop_name(&mut args, "caller_id")?;
            let topic = pop_name(&mut args, "topic")?;
            let _caller_api = pop_string(&mut args, "caller_api")?;
            let removed = directory
                .lock()
                .expect(FAILED_TO_LOCK)
                .unregister_publisher(&caller_id, &topic);
            Ok(Value::Int(removed as i32))
        });

        let directory = Arc::clone(&manager);

        server.register_value(
            "unregisterSubscriber",
            "Subscriber unregistered",
            move |args| {
                let mut args = unwrap_array_case(args).into_iter();
                let caller_id = pop_name(&mut args, "caller_id")?;
                let topic = pop_name(&mut args, "topic")?;
                let _caller_api = pop_string(&mut args, "caller_api")?;
                let removed = directory
                    .lock()
                    .expect(FAILED_TO_LOCK)
                    .unregister_subscriber(&caller_id, &topic);
                Ok(Value::Int(removed as i32))
            },
        );

        let directory = Arc::clone(&manager);

        server.register_value("registerService", "Service registered", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let caller_id = pop_name(&mut args, "caller_id")?;
            let service = pop_name(&mut args, "service")?;
            let service_api = pop_string(&mut args, "service_api")?;
            let caller_api = pop_string(&mut args, "caller_api")?;
            directory
                .lock()
                .expect(FAILED_TO_LOCK)
                .register_service(&caller_id, &caller_api, &service, &service_api);
            Ok(Value::Int(1))
        });

        let directory = Arc::clone(&manager);

        server.register_value("unregisterService", "Service unregistered", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let caller_id = pop_name(&mut args, "caller_id")?;
            let service = pop_name(&mut args, "service")?;
            let service_api = pop_string(&mut args, "service_api")?;
            let removed = directory
                .lock()
                .expect(FAILED_TO_LOCK)
                .unregister_service(&caller_id, &service, &service_api);
            Ok(Value::Int(removed as i32))
        });

        let directory = Arc::clone(&manager);

        server.register_value("lookupNode", "Node found", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let _caller_id = pop_name(&mut args, "caller_id")?;
            let node_name = pop_name(&mut args, "node_name")?;
            directory
                .lock()
                .expect(FAILED_TO_LOCK)
                .node_uri(&node_name)
                .map(|uri| Value::String(uri.into()))
                .ok_or_else(|| {
                    ResponseError::Server(format!("Node {} is not registered", node_name))
                })
        });

        let directory = Arc::clone(&manager);

        server.register_value("lookupService", "Service found", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let _caller_id = pop_name(&mut args, "caller_id")?;
            let service = pop_name(&mut args, "service")?;
            directory
                .lock()
                .expect(FAILED_TO_LOCK)
                .service_uri(&service)
                .map(|uri| Value::String(uri.into()))
                .ok_or_else(|| {
                    ResponseError::Server(format!("Service {} is not registered", service))
                })
        });

        let directory = Arc::clone(&manager);

        server.register_value("getPublishedTopics", "Published topics", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let _caller_id = pop_name(&mut args, "caller_id")?;
            let subgraph = pop_string(&mut args, "subgraph")?;
            if !subgraph.is_empty() && subgraph != "/" {
                return Err(ResponseError::Server(
                    "Subgraph filtering is not supported".into(),
                ));
            }
            Ok(Value::Array(
                directory
                    .lock()
                    .expect(FAILED_TO_LOCK)
                    .all_topics()
                    .filter(|topic| topic.has_publishers())
                    .map(|topic| {
                        Value::Array(vec![
                            Value::String(topic.name().to_string()),
                            Value::String(topic.message_type().into()),
                        ])
                    })
                    .collect(),
            ))
        });

        let directory = Arc::clone(&manager);

        server.register_value("getTopicTypes", "Topic types", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let _caller_id = pop_name(&mut args, "caller_id")?;
            Ok(Value::Array(
                directory
                    .lock()
                    .expect(FAILED_TO_LOCK)
                    .all_topics()
                    .map(|topic| {
                        Value::Array(vec![
                            Value::String(topic.name().to_string()),
                            Value::String(topic.message_type().into()),
                        ])
                    })
                    .collect(),
            ))
        });

        let directory = Arc::clone(&manager);

        server.register_value("getSystemState", "System state", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let _caller_id = pop_name(&mut args, "caller_id")?;
            let directory = directory.lock().expect(FAILED_TO_LOCK);
            let publishers = directory
                .all_topics()
                .filter(|topic| topic.has_publishers())
                .map(|topic| participant_entry(&topic.name().to_string(), topic.publishers().iter()))
                .collect();
            let subscribers = directory
                .all_topics()
                .filter(|topic| topic.has_subscribers())
                .map(|topic| participant_entry(&topic.name().to_string(), topic.subscribers().iter()))
                .collect();
            let services = directory
                .all_services()
                .map(|service| {
                    participant_entry(
                        &service.name().to_string(),
                        std::iter::once(service.provider()),
                    )
                })
                .collect();
            Ok(Value::Array(vec![
                Value::Array(publishers),
                Value::Array(subscribers),
                Value::Array(services),
            ]))
        });

        server.register_value("getUri", "Master URI", move |_args| {
            Ok(Value::String(
                advertised_uri.lock().expect(FAILED_TO_LOCK).clone(),
            ))
        });

        server.register_value("shutdown", "Shutdown", move |args| {
            let mut args = unwrap_array_case(args).into_iter();
            let _caller_id = pop_string(&mut args, "caller_id")?;
            let message = pop_string(&mut args, "message").unwrap_or_default();
            info!("Master is shutting down because: {}", message);
            match shutdown_signal.send() {
                Ok(()) => Ok(Value::Int(0)),
                Err(err) => {
                    error!("Shutdown error: {:?}", err);
                    Err(ResponseError::Server("Failed to shut down".into()))
                }
            }
        });

        MasterHandler { server }
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

fn participant_entry<'a>(
    name: &str,
    nodes: impl Iterator<Item = &'a GraphName>,
) -> Value {
    Value::Array(vec![
        Value::String(name.into()),
        Value::Array(nodes.map(|node| Value::String(node.to_string())).collect()),
    ])
}

// The push is fire and forget per subscriber: one dead or slow subscriber
// must neither fail the registration nor hold up delivery to the others.
fn send_publisher_updates(topic: &GraphName, publisher_uris: &[String], subscriber_uris: &[String]) {
    for subscriber_uri in subscriber_uris {
        let topic = topic.to_string();
        let publishers = publisher_uris.to_vec();
        let subscriber_uri = subscriber_uri.clone();
        thread::spawn(move || {
            let client = match SlaveClient::new(&subscriber_uri, MASTER_CALLER_ID) {
                Ok(client) => client,
                Err(err) => {
                    error!(
                        "Failed to prepare publisher update for {}: {}",
                        subscriber_uri, err
                    );
                    return;
                }
            };
            if let Err(err) = client.publisher_update(&topic, &publishers) {
                error!(
                    "Failed to send publisher update for {} to {}: {}",
                    topic, subscriber_uri, err
                );
            }
        });
    }
}

mod handler;
mod publications;
mod subscriptions;

pub use self::publications::{Publication, PublicationsTracker};
pub use self::subscriptions::{Subscription, SubscriptionsTracker};

use self::handler::SlaveHandler;
use crate::api::client::MasterClient;
use crate::api::error::{ErrorKind, Result, ResultExt};
use crate::rosxmlrpc::Response;
use crate::util::{kill, FAILED_TO_LOCK, MPSC_CHANNEL_UNEXPECTEDLY_CLOSED};
use crossbeam::channel::{unbounded, TryRecvError};
use error_chain::bail;
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::thread;

/// Name and message type of one data channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub msg_type: String,
}

/// Lifecycle of a slave server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    Unstarted,
    Running,
    ShuttingDown,
    Stopped,
}

/// The per-node server: tracks this node's own publishers, subscribers and
/// services, registers them with the master, and answers calls from the
/// master and from peer nodes.
#[derive(Debug)]
pub struct Slave {
    name: String,
    master_uri: String,
    hostname: String,
    bind_address: String,
    requested_port: u16,
    uri: Arc<Mutex<Option<String>>>,
    master: Arc<Mutex<Option<MasterClient>>>,
    state: Arc<Mutex<ServerState>>,
    shutdown_tx: kill::Sender,
    shutdown_rx: Mutex<Option<kill::Receiver>>,
    pub publications: PublicationsTracker,
    pub subscriptions: SubscriptionsTracker,
    services: Arc<Mutex<HashMap<String, String>>>,
}

impl Slave {
    /// Prepares a slave without binding anything yet; `start` does that.
    pub fn new(
        master_uri: &str,
        hostname: &str,
        bind_address: &str,
        port: u16,
        name: &str,
    ) -> Slave {
        let (shutdown_tx, shutdown_rx) = kill::channel();
        Slave {
            name: String::from(name),
            master_uri: String::from(master_uri),
            hostname: String::from(hostname),
            bind_address: String::from(bind_address),
            requested_port: port,
            uri: Arc::new(Mutex::new(None)),
            master: Arc::new(Mutex::new(None)),
            state: Arc::new(Mutex::new(ServerState::Unstarted)),
            shutdown_tx,
            shutdown_rx: Mutex::new(Some(shutdown_rx)),
            publications: PublicationsTracker::default(),
            subscriptions: SubscriptionsTracker::default(),
            services: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Binds the server and starts answering requests.
    ///
    /// Not idempotent: a slave starts once, and a stopped slave stays
    /// stopped.
    pub fn start(&self) -> Result<()> {
        use std::net::ToSocketAddrs;

        let mut state = self.state.lock().expect(FAILED_TO_LOCK);
        if *state != ServerState::Unstarted {
            bail!(ErrorKind::AlreadyRunning("Slave".into()));
        }
        let socket_addr = match (self.bind_address.as_str(), self.requested_port)
            .to_socket_addrs()?
            .next()
        {
            Some(socket_addr) => socket_addr,
            None => bail!(ErrorKind::MalformedUri(format!(
                "{}:{}",
                self.bind_address, self.requested_port
            ))),
        };
        let shutdown_rx = self
            .shutdown_rx
            .lock()
            .expect(FAILED_TO_LOCK)
            .take()
            .expect(MPSC_CHANNEL_UNEXPECTEDLY_CLOSED);

        let handler = SlaveHandler::new(
            &self.master_uri,
            &self.hostname,
            Arc::clone(&self.state),
            self.shutdown_tx.clone(),
            self.publications.clone(),
            self.subscriptions.clone(),
        );
        let (port_tx, port_rx) = unbounded();
        let thread_state = Arc::clone(&self.state);

        thread::spawn(move || {
            let bound_handler = match handler.bind(&socket_addr) {
                Ok(v) => v,
                Err(err) => {
                    port_tx
                        .send(Err(err))
                        .expect(MPSC_CHANNEL_UNEXPECTEDLY_CLOSED);
                    return;
                }
            };
            let port = bound_handler.local_addr().port();
            port_tx
                .send(Ok(port))
                .expect(MPSC_CHANNEL_UNEXPECTEDLY_CLOSED);
            loop {
                match shutdown_rx.try_recv() {
                    Ok(_) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }
                bound_handler.poll();
            }
            *thread_state.lock().expect(FAILED_TO_LOCK) = ServerState::Stopped;
            info!("Slave server stopped");
        });

        let port = match port_rx.recv().expect(MPSC_CHANNEL_UNEXPECTEDLY_CLOSED) {
            Ok(port) => port,
            Err(err) => {
                *state = ServerState::Stopped;
                return Err(err.into());
            }
        };
        let uri = format!("http://{}:{}/", self.hostname, port);
        let master = match MasterClient::new(&self.master_uri, &self.name, &uri) {
            Ok(client) => client,
            Err(err) => {
                self.shutdown_tx.send().is_ok();
                *state = ServerState::ShuttingDown;
                return Err(err).chain_err(|| "Failed to prepare the master client");
            }
        };
        *self.uri.lock().expect(FAILED_TO_LOCK) = Some(uri);
        *self.master.lock().expect(FAILED_TO_LOCK) = Some(master);
        *state = ServerState::Running;
        Ok(())
    }

    /// Stops the server and releases its listener.
    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.state.lock().expect(FAILED_TO_LOCK);
        match *state {
            ServerState::Running => {
                *state = ServerState::ShuttingDown;
                // The poll loop notices the signal and winds down on its own.
                self.shutdown_tx.send().is_ok();
                Ok(())
            }
            _ => bail!(ErrorKind::NotRunning("shutdown".into())),
        }
    }

    pub fn state(&self) -> ServerState {
        *self.state.lock().expect(FAILED_TO_LOCK)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn master_uri(&self) -> &str {
        &self.master_uri
    }

    /// The URI this slave answers on; available once running.
    pub fn uri(&self) -> Result<String> {
        match self.uri.lock().expect(FAILED_TO_LOCK).as_ref() {
            Some(uri) => Ok(uri.clone()),
            None => bail!(ErrorKind::NotRunning("uri".into())),
        }
    }

    /// Asks the master for its own advertised URI, proving it is reachable.
    pub fn ping_master(&self) -> Result<String> {
        self.with_master("ping_master", |master| master.get_uri())
    }

    /// Starts publishing a topic and announces it to the master.
    ///
    /// The port names where this node's data transport serves the topic;
    /// `requestTopic` hands it to interested subscribers.
    pub fn add_publication(&self, topic: &str, msg_type: &str, port: u16) -> Result<()> {
        self.ensure_running("add_publication")?;
        self.publications.add(topic, msg_type, port)?;
        match self.with_master("add_publication", |master| {
            master.register_publisher(topic, msg_type)
        }) {
            Ok(subscribers) => {
                debug!(
                    "Topic {} registered with {} existing subscribers",
                    topic,
                    subscribers.len()
                );
                Ok(())
            }
            Err(err) => {
                self.publications.remove(topic);
                Err(err).chain_err(|| format!("Failed to register publisher for {}", topic))
            }
        }
    }

    /// Stops publishing a topic and withdraws it from the master.
    pub fn remove_publication(&self, topic: &str) -> Result<()> {
        self.ensure_running("remove_publication")?;
        self.publications.remove(topic);
        self.with_master("remove_publication", |master| {
            master.unregister_publisher(topic)
        })
        .map(|_| ())
    }

    /// Starts subscribing to a topic and announces it to the master.
    ///
    /// The publisher set is seeded from the registration response and kept
    /// current by the master's publisher updates afterwards.
    pub fn add_subscription(&self, topic: &str, msg_type: &str) -> Result<()> {
        self.ensure_running("add_subscription")?;
        self.subscriptions.add(topic, msg_type)?;
        match self.with_master("add_subscription", |master| {
            master.register_subscriber(topic, msg_type)
        }) {
            Ok(publishers) => {
                let publishers: BTreeSet<String> = publishers.into_iter().collect();
                if let Some((appeared, _)) = self.subscriptions.update_publishers(topic, &publishers)
                {
                    for uri in appeared {
                        debug!("Topic {} gained publisher {}", topic, uri);
                    }
                }
                Ok(())
            }
            Err(err) => {
                self.subscriptions.remove(topic);
                Err(err).chain_err(|| format!("Failed to register subscriber for {}", topic))
            }
        }
    }

    /// Stops subscribing to a topic and withdraws it from the master.
    pub fn remove_subscription(&self, topic: &str) -> Result<()> {
        self.ensure_running("remove_subscription")?;
        self.subscriptions.remove(topic);
        self.with_master("remove_subscription", |master| {
            master.unregister_subscriber(topic)
        })
        .map(|_| ())
    }

    /// Starts providing a service and announces it to the master.
    pub fn add_service(&self, service: &str, service_uri: &str) -> Result<()> {
        use std::collections::hash_map::Entry;
        self.ensure_running("add_service")?;
        match self
            .services
            .lock()
            .expect(FAILED_TO_LOCK)
            .entry(String::from(service))
        {
            Entry::Occupied(..) => {
                bail!(ErrorKind::Duplicate("service".into()));
            }
            Entry::Vacant(entry) => {
                entry.insert(String::from(service_uri));
            }
        }
        match self.with_master("add_service", |master| {
            master.register_service(service, service_uri)
        }) {
            Ok(_) => Ok(()),
            Err(err) => {
                self.services.lock().expect(FAILED_TO_LOCK).remove(service);
                Err(err).chain_err(|| format!("Failed to register service {}", service))
            }
        }
    }

    /// Stops providing a service and withdraws it from the master.
    pub fn remove_service(&self, service: &str) -> Result<()> {
        self.ensure_running("remove_service")?;
        let service_uri = self.services.lock().expect(FAILED_TO_LOCK).remove(service);
        match service_uri {
            Some(service_uri) => self
                .with_master("remove_service", |master| {
                    master.unregister_service(service, &service_uri)
                })
                .map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn services<T: std::iter::FromIterator<(String, String)>>(&self) -> T {
        self.services
            .lock()
            .expect(FAILED_TO_LOCK)
            .iter()
            .map(|(name, uri)| (name.clone(), uri.clone()))
            .collect()
    }

    fn ensure_running(&self, operation: &str) -> Result<()> {
        match *self.state.lock().expect(FAILED_TO_LOCK) {
            ServerState::Running => Ok(()),
            _ => bail!(ErrorKind::NotRunning(operation.into())),
        }
    }

    fn with_master<T>(
        &self,
        operation: &str,
        action: impl FnOnce(&MasterClient) -> Response<T>,
    ) -> Result<T> {
        let master = self.master.lock().expect(FAILED_TO_LOCK);
        match master.as_ref() {
            Some(client) => action(client).map_err(Into::into),
            None => bail!(ErrorKind::NotRunning(operation.into())),
        }
    }
}

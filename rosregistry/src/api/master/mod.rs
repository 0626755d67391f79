mod handler;
pub mod registration;

pub use self::registration::{
    NodeRegistrationInfo, RegistrationManager, ServiceRegistrationInfo, TopicRegistrationInfo,
};

use self::handler::MasterHandler;
use crate::api::client::SlaveClient;
use crate::api::error::{ErrorKind, Result};
use crate::util::{kill, FAILED_TO_LOCK, MPSC_CHANNEL_UNEXPECTEDLY_CLOSED};
use crossbeam::channel::{unbounded, TryRecvError};
use error_chain::bail;
use log::{info, warn};
use std::sync::{Arc, Mutex};
use std::thread;

/// The node name the master announces itself as when calling slaves.
pub const MASTER_CALLER_ID: &str = "/master";

/// The central name service.
///
/// Owns the registration directory for its whole lifetime and exposes it
/// over XML-RPC. Nothing survives a restart; every slave has to register
/// again with the fresh instance.
pub struct Master {
    uri: String,
    shutdown_tx: kill::Sender,
}

impl Master {
    /// Binds the master's server and starts answering requests.
    ///
    /// Passing port 0 picks a free port; the advertised URI reports the
    /// port that was actually bound.
    pub fn new(hostname: &str, bind_address: &str, port: u16) -> Result<Master> {
        use std::net::ToSocketAddrs;

        let (shutdown_tx, shutdown_rx) = kill::channel();
        let advertised_uri = Arc::new(Mutex::new(String::new()));
        let manager = Arc::new(Mutex::new(RegistrationManager::new(Box::new(
            notify_replaced_slave,
        ))));
        let handler = MasterHandler::new(
            Arc::clone(&manager),
            Arc::clone(&advertised_uri),
            shutdown_tx.clone(),
        );
        let (port_tx, port_rx) = unbounded();
        let socket_addr = match (bind_address, port).to_socket_addrs()?.next() {
            Some(socket_addr) => socket_addr,
            None => bail!(ErrorKind::MalformedUri(format!("{}:{}", bind_address, port))),
        };

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
            info!("Master server stopped");
        });

        let port = port_rx.recv().expect(MPSC_CHANNEL_UNEXPECTEDLY_CLOSED)?;
        let uri = format!("http://{}:{}/", hostname, port);
        *advertised_uri.lock().expect(FAILED_TO_LOCK) = uri.clone();

        Ok(Master { uri, shutdown_tx })
    }

    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Stops the server and releases its listener.
    pub fn shutdown(&self) {
        if self.shutdown_tx.send().is_err() {
            warn!("Master server was already shut down");
        }
    }
}

// Runs under the directory lock, so the actual call happens on a detached
// thread. The old slave being unreachable is expected and never affects
// the registration that displaced it.
fn notify_replaced_slave(old: &NodeRegistrationInfo) {
    warn!(
        "Existing node {} with slave URI {} will be shut down",
        old.name(),
        old.slave_uri()
    );
    let slave_uri = old.slave_uri().to_string();
    thread::spawn(move || {
        let client = match SlaveClient::new(&slave_uri, MASTER_CALLER_ID) {
            Ok(client) => client,
            Err(err) => {
                warn!("Could not address replaced slave at {}: {}", slave_uri, err);
                return;
            }
        };
        if let Err(err) = client.shutdown("Replaced by new slave") {
            info!(
                "Replaced slave at {} did not take the shutdown call: {}",
                slave_uri, err
            );
        }
    });
}

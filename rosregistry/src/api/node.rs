use super::error::{Result, ResultExt};
use super::resolve;
use super::slave::Slave;
use log::info;
use ros_names::{GraphName, NodeNameResolver};
use std::collections::HashMap;

/// One participant process in the graph.
///
/// Ties the pieces together: resolves the configured name, starts the
/// slave server, verifies the master is reachable, and resolves every
/// caller-supplied name before it is registered.
#[derive(Debug)]
pub struct Node {
    slave: Slave,
    resolver: NodeNameResolver,
    name: String,
}

impl Node {
    /// Creates a node configured from command line arguments and the
    /// environment, with `name` as the fallback node name.
    pub fn new(name: &str) -> Result<Node> {
        let namespace = resolve::namespace();
        let master_uri = resolve::master();
        let hostname = resolve::hostname();
        let name = resolve::name(name);
        let mut remappings = HashMap::new();
        for (source, destination) in resolve::mappings() {
            remappings.insert(source.parse()?, destination.parse()?);
        }
        Node::new_raw(&master_uri, &hostname, &namespace, &name, remappings)
    }

    pub fn new_raw(
        master_uri: &str,
        hostname: &str,
        namespace: &str,
        name: &str,
        remappings: HashMap<GraphName, GraphName>,
    ) -> Result<Node> {
        let namespace = namespace.trim_end_matches('/');

        if name.contains('/') {
            return Err(ros_names::Error::InvalidName {
                name: name.into(),
                reason: "node names cannot contain namespace separators".into(),
            }
            .into());
        }

        let node_name = GraphName::new(format!("{}/{}", namespace, name))?.to_global();
        let resolver = NodeNameResolver::new(node_name.clone(), remappings)?;

        let slave = Slave::new(master_uri, hostname, hostname, 0, node_name.as_str());
        slave.start()?;
        // Discovery is not optional: refuse to come up half-connected.
        let reported = match slave.ping_master() {
            Ok(reported) => reported,
            Err(err) => {
                slave.shutdown().is_ok();
                return Err(err)
                    .chain_err(|| format!("Could not reach the ROS master at {}", master_uri));
            }
        };
        info!("Node {} connected to master at {}", node_name, reported);

        Ok(Node {
            slave,
            resolver,
            name: node_name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> Result<String> {
        self.slave.uri()
    }

    pub fn slave(&self) -> &Slave {
        &self.slave
    }

    /// Announces this node as a publisher of the topic.
    ///
    /// The port is where the node's data transport serves the topic.
    pub fn advertise(&self, topic: &str, msg_type: &str, port: u16) -> Result<GraphName> {
        let topic = self.resolver.resolve(topic)?;
        self.slave.add_publication(topic.as_str(), msg_type, port)?;
        Ok(topic)
    }

    pub fn unadvertise(&self, topic: &str) -> Result<()> {
        let topic = self.resolver.resolve(topic)?;
        self.slave.remove_publication(topic.as_str())
    }

    /// Announces this node as a subscriber of the topic.
    pub fn subscribe(&self, topic: &str, msg_type: &str) -> Result<GraphName> {
        let topic = self.resolver.resolve(topic)?;
        self.slave.add_subscription(topic.as_str(), msg_type)?;
        Ok(topic)
    }

    pub fn unsubscribe(&self, topic: &str) -> Result<()> {
        let topic = self.resolver.resolve(topic)?;
        self.slave.remove_subscription(topic.as_str())
    }

    /// Announces this node as the provider of the service.
    pub fn advertise_service(&self, service: &str, service_uri: &str) -> Result<GraphName> {
        let service = self.resolver.resolve(service)?;
        self.slave.add_service(service.as_str(), service_uri)?;
        Ok(service)
    }

    pub fn unadvertise_service(&self, service: &str) -> Result<()> {
        let service = self.resolver.resolve(service)?;
        self.slave.remove_service(service.as_str())
    }

    pub fn shutdown(&self) -> Result<()> {
        self.slave.shutdown()
    }
}

use log::warn;
use ros_names::GraphName;
use std::collections::{BTreeMap, BTreeSet};

/// Invoked with the superseded node before its replacement is installed.
///
/// Runs under the directory lock, so implementations must hand any network
/// work (such as telling the old slave to shut down) to another thread.
pub type ReplacementCallback = Box<dyn Fn(&NodeRegistrationInfo) + Send>;

/// One live node: its graph name and the URI of its slave server.
///
/// Also carries the reverse indices used to clean up after the node when it
/// is replaced or runs out of registrations.
#[derive(Clone, Debug)]
pub struct NodeRegistrationInfo {
    name: GraphName,
    slave_uri: String,
    publications: BTreeSet<GraphName>,
    subscriptions: BTreeSet<GraphName>,
    services: BTreeSet<GraphName>,
}

impl NodeRegistrationInfo {
    fn new(name: GraphName, slave_uri: &str) -> Self {
        NodeRegistrationInfo {
            name,
            slave_uri: slave_uri.into(),
            publications: BTreeSet::new(),
            subscriptions: BTreeSet::new(),
            services: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &GraphName {
        &self.name
    }

    pub fn slave_uri(&self) -> &str {
        &self.slave_uri
    }

    fn has_registrations(&self) -> bool {
        !self.publications.is_empty() || !self.subscriptions.is_empty() || !self.services.is_empty()
    }
}

/// One topic: its message type and the nodes publishing and subscribing.
#[derive(Clone, Debug)]
pub struct TopicRegistrationInfo {
    name: GraphName,
    message_type: String,
    publishers: BTreeSet<GraphName>,
    subscribers: BTreeSet<GraphName>,
}

impl TopicRegistrationInfo {
    fn new(name: GraphName, message_type: &str) -> Self {
        TopicRegistrationInfo {
            name,
            message_type: message_type.into(),
            publishers: BTreeSet::new(),
            subscribers: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &GraphName {
        &self.name
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn publishers(&self) -> &BTreeSet<GraphName> {
        &self.publishers
    }

    pub fn subscribers(&self) -> &BTreeSet<GraphName> {
        &self.subscribers
    }

    pub fn has_publishers(&self) -> bool {
        !self.publishers.is_empty()
    }

    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.is_empty()
    }

    // Type agreement is advisory: the first concrete type wins, later
    // mismatches are reported but accepted. The wildcard never binds.
    fn note_message_type(&mut self, message_type: &str) {
        if message_type == "*" || self.message_type == message_type {
            return;
        }
        if self.message_type == "*" {
            self.message_type = message_type.into();
            return;
        }
        warn!(
            "Topic {} has message type {}, ignoring mismatched registration as {}",
            self.name, self.message_type, message_type
        );
    }
}

/// One service: its providing node and the URI the service answers on.
///
/// A service has at most one provider; a new registration overwrites the
/// previous one.
#[derive(Clone, Debug)]
pub struct ServiceRegistrationInfo {
    name: GraphName,
    provider: GraphName,
    service_uri: String,
}

impl ServiceRegistrationInfo {
    pub fn name(&self) -> &GraphName {
        &self.name
    }

    pub fn provider(&self) -> &GraphName {
        &self.provider
    }

    pub fn service_uri(&self) -> &str {
        &self.service_uri
    }
}

/// The master's directory of topics, services and nodes.
///
/// Not internally synchronized: the owning master serializes all access
/// through a single mutex, and nothing else may hold a reference.
pub struct RegistrationManager {
    topics: BTreeMap<GraphName, TopicRegistrationInfo>,
    services: BTreeMap<GraphName, ServiceRegistrationInfo>,
    nodes: BTreeMap<GraphName, NodeRegistrationInfo>,
    on_node_replacement: ReplacementCallback,
}

impl RegistrationManager {
    pub fn new(on_node_replacement: ReplacementCallback) -> Self {
        RegistrationManager {
            topics: BTreeMap::new(),
            services: BTreeMap::new(),
            nodes: BTreeMap::new(),
            on_node_replacement,
        }
    }

    /// Adds the node as a publisher of the topic, creating both entries if
    /// needed, and returns a snapshot of the topic's current state.
    pub fn register_publisher(
        &mut self,
        node_name: &GraphName,
        node_slave_uri: &str,
        topic_name: &GraphName,
        message_type: &str,
    ) -> TopicRegistrationInfo {
        self.register_node(node_name, node_slave_uri);
        let topic = self
            .topics
            .entry(topic_name.clone())
            .or_insert_with(|| TopicRegistrationInfo::new(topic_name.clone(), message_type));
        topic.note_message_type(message_type);
        topic.publishers.insert(node_name.clone());
        let snapshot = topic.clone();
        if let Some(node) = self.nodes.get_mut(node_name) {
            node.publications.insert(topic_name.clone());
        }
        snapshot
    }

    /// Adds the node as a subscriber of the topic, creating both entries if
    /// needed, and returns a snapshot of the topic's current state.
    pub fn register_subscriber(
        &mut self,
        node_name: &GraphName,
        node_slave_uri: &str,
        topic_name: &GraphName,
        message_type: &str,
    ) -> TopicRegistrationInfo {
        self.register_node(node_name, node_slave_uri);
        let topic = self
            .topics
            .entry(topic_name.clone())
            .or_insert_with(|| TopicRegistrationInfo::new(topic_name.clone(), message_type));
        topic.note_message_type(message_type);
        topic.subscribers.insert(node_name.clone());
        let snapshot = topic.clone();
        if let Some(node) = self.nodes.get_mut(node_name) {
            node.subscriptions.insert(topic_name.clone());
        }
        snapshot
    }

    /// Registers the node as the provider of the service, overwriting any
    /// previous provider.
    pub fn register_service(
        &mut self,
        node_name: &GraphName,
        node_slave_uri: &str,
        service_name: &GraphName,
        service_uri: &str,
    ) {
        self.register_node(node_name, node_slave_uri);
        let info = ServiceRegistrationInfo {
            name: service_name.clone(),
            provider: node_name.clone(),
            service_uri: service_uri.into(),
        };
        if let Some(previous) = self.services.insert(service_name.clone(), info) {
            if previous.provider != *node_name {
                if let Some(node) = self.nodes.get_mut(&previous.provider) {
                    node.services.remove(service_name);
                }
                self.drop_node_if_empty(&previous.provider);
            }
        }
        if let Some(node) = self.nodes.get_mut(node_name) {
            node.services.insert(service_name.clone());
        }
    }

    /// Removes the node from the topic's publisher set.
    ///
    /// Idempotent: returns whether a removal actually happened.
    pub fn unregister_publisher(&mut self, node_name: &GraphName, topic_name: &GraphName) -> bool {
        let removed = match self.topics.get_mut(topic_name) {
            Some(topic) => topic.publishers.remove(node_name),
            None => false,
        };
        if removed {
            self.drop_topic_if_empty(topic_name);
            if let Some(node) = self.nodes.get_mut(node_name) {
                node.publications.remove(topic_name);
            }
            self.drop_node_if_empty(node_name);
        }
        removed
    }

    /// Removes the node from the topic's subscriber set.
    ///
    /// Idempotent: returns whether a removal actually happened.
    pub fn unregister_subscriber(&mut self, node_name: &GraphName, topic_name: &GraphName) -> bool {
        let removed = match self.topics.get_mut(topic_name) {
            Some(topic) => topic.subscribers.remove(node_name),
            None => false,
        };
        if removed {
            self.drop_topic_if_empty(topic_name);
            if let Some(node) = self.nodes.get_mut(node_name) {
                node.subscriptions.remove(topic_name);
            }
            self.drop_node_if_empty(node_name);
        }
        removed
    }

    /// Removes the service if the URI still matches the current provider.
    ///
    /// A stale unregister whose URI no longer matches is a no-op.
    pub fn unregister_service(
        &mut self,
        node_name: &GraphName,
        service_name: &GraphName,
        service_uri: &str,
    ) -> bool {
        match self.services.get(service_name) {
            Some(service) if service.service_uri == service_uri => {}
            _ => return false,
        }
        if let Some(service) = self.services.remove(service_name) {
            if service.provider != *node_name {
                warn!(
                    "Service {} was unregistered by {} but provided by {}",
                    service_name, node_name, service.provider
                );
            }
            if let Some(node) = self.nodes.get_mut(&service.provider) {
                node.services.remove(service_name);
            }
            self.drop_node_if_empty(&service.provider);
        }
        true
    }

    pub fn node(&self, node_name: &GraphName) -> Option<&NodeRegistrationInfo> {
        self.nodes.get(node_name)
    }

    pub fn node_uri(&self, node_name: &GraphName) -> Option<&str> {
        self.nodes.get(node_name).map(|v| v.slave_uri.as_str())
    }

    pub fn service(&self, service_name: &GraphName) -> Option<&ServiceRegistrationInfo> {
        self.services.get(service_name)
    }

    pub fn service_uri(&self, service_name: &GraphName) -> Option<&str> {
        self.services
            .get(service_name)
            .map(|v| v.service_uri.as_str())
    }

    pub fn topic(&self, topic_name: &GraphName) -> Option<&TopicRegistrationInfo> {
        self.topics.get(topic_name)
    }

    pub fn all_topics(&self) -> impl Iterator<Item = &TopicRegistrationInfo> {
        self.topics.values()
    }

    pub fn all_services(&self) -> impl Iterator<Item = &ServiceRegistrationInfo> {
        self.services.values()
    }

    /// Looks up the slave URIs of the given nodes, skipping ones that have
    /// disappeared in the meantime.
    pub fn node_uris<'a>(&self, names: impl IntoIterator<Item = &'a GraphName>) -> Vec<String> {
        names
            .into_iter()
            .filter_map(|name| self.nodes.get(name))
            .map(|node| node.slave_uri.clone())
            .collect()
    }

    // Upserts the node entry. A known name arriving with a different slave
    // URI means the process restarted: the replacement callback fires and
    // the old process's registrations are purged before the new entry is
    // installed.
    fn register_node(&mut self, node_name: &GraphName, node_slave_uri: &str) {
        match self.nodes.get(node_name) {
            Some(existing) if existing.slave_uri == node_slave_uri => return,
            _ => {}
        }
        if let Some(old) = self.nodes.remove(node_name) {
            warn!(
                "Node {} re-registered from {}, replacing slave at {}",
                old.name, node_slave_uri, old.slave_uri
            );
            (self.on_node_replacement)(&old);
            self.purge_node_registrations(&old);
        }
        self.nodes.insert(
            node_name.clone(),
            NodeRegistrationInfo::new(node_name.clone(), node_slave_uri),
        );
    }

    fn purge_node_registrations(&mut self, old: &NodeRegistrationInfo) {
        for topic_name in &old.publications {
            if let Some(topic) = self.topics.get_mut(topic_name) {
                topic.publishers.remove(&old.name);
            }
        }
        for topic_name in &old.subscriptions {
            if let Some(topic) = self.topics.get_mut(topic_name) {
                topic.subscribers.remove(&old.name);
            }
        }
        for service_name in &old.services {
            let owned = self
                .services
                .get(service_name)
                .map_or(false, |v| v.provider == old.name);
            if owned {
                self.services.remove(service_name);
            }
        }
        self.topics
            .retain(|_, topic| topic.has_publishers() || topic.has_subscribers());
    }

    fn drop_topic_if_empty(&mut self, topic_name: &GraphName) {
        let empty = self
            .topics
            .get(topic_name)
            .map_or(false, |v| !v.has_publishers() && !v.has_subscribers());
        if empty {
            self.topics.remove(topic_name);
        }
    }

    fn drop_node_if_empty(&mut self, node_name: &GraphName) {
        let empty = self
            .nodes
            .get(node_name)
            .map_or(false, |v| !v.has_registrations());
        if empty {
            self.nodes.remove(node_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    static FAILED_TO_LOCK: &str = "Failed to acquire lock";

    fn name(value: &str) -> GraphName {
        value.parse().expect("Unexpected invalid graph name")
    }

    fn manager() -> (RegistrationManager, Arc<Mutex<Vec<(String, String)>>>) {
        let replacements = Arc::new(Mutex::new(Vec::new()));
        let tracked = Arc::clone(&replacements);
        let manager = RegistrationManager::new(Box::new(move |old: &NodeRegistrationInfo| {
            tracked
                .lock()
                .expect(FAILED_TO_LOCK)
                .push((old.name().to_string(), old.slave_uri().to_string()));
        }));
        (manager, replacements)
    }

    #[test]
    fn registrations_converge_per_topic() {
        let (mut manager, _) = manager();
        let first = manager.register_publisher(&name("/a"), "http://host:1/", &name("/t"), "pkg/T");
        assert!(first.subscribers().is_empty());
        let second =
            manager.register_subscriber(&name("/b"), "http://host:2/", &name("/t"), "pkg/T");
        assert_eq!(
            vec![name("/a")],
            second.publishers().iter().cloned().collect::<Vec<_>>()
        );
        let topics: Vec<_> = manager.all_topics().collect();
        assert_eq!(1, topics.len());
        assert_eq!(&name("/t"), topics[0].name());
        assert_eq!("pkg/T", topics[0].message_type());
        assert_eq!(
            vec![name("/a")],
            topics[0].publishers().iter().cloned().collect::<Vec<_>>()
        );
        assert_eq!(
            vec![name("/b")],
            topics[0].subscribers().iter().cloned().collect::<Vec<_>>()
        );
        assert_eq!(
            vec![String::from("http://host:1/")],
            manager.node_uris(second.publishers())
        );
    }

    #[test]
    fn unregistering_is_idempotent() {
        let (mut manager, _) = manager();
        manager.register_publisher(&name("/a"), "http://host:1/", &name("/t"), "pkg/T");
        manager.register_subscriber(&name("/b"), "http://host:2/", &name("/t"), "pkg/T");
        assert!(manager.unregister_publisher(&name("/a"), &name("/t")));
        assert!(!manager.unregister_publisher(&name("/a"), &name("/t")));
        let topic = manager.topic(&name("/t")).expect("Topic disappeared");
        assert!(!topic.has_publishers());
        assert!(topic.has_subscribers());
        assert!(manager.unregister_subscriber(&name("/b"), &name("/t")));
        assert!(!manager.unregister_subscriber(&name("/b"), &name("/t")));
    }

    #[test]
    fn empty_entries_are_collected() {
        let (mut manager, _) = manager();
        manager.register_publisher(&name("/a"), "http://host:1/", &name("/t"), "pkg/T");
        assert!(manager.unregister_publisher(&name("/a"), &name("/t")));
        assert!(manager.topic(&name("/t")).is_none());
        assert_eq!(0, manager.all_topics().count());
        assert!(manager.node_uri(&name("/a")).is_none());
    }

    #[test]
    fn replacement_notifies_exactly_once_before_installing() {
        let (mut manager, replacements) = manager();
        manager.register_publisher(&name("/n"), "http://host:1/", &name("/t"), "pkg/T");
        manager.register_publisher(&name("/n"), "http://host:2/", &name("/t2"), "pkg/T");
        assert_eq!(
            vec![(String::from("/n"), String::from("http://host:1/"))],
            replacements.lock().expect(FAILED_TO_LOCK).clone()
        );
        assert_eq!(Some("http://host:2/"), manager.node_uri(&name("/n")));
        // The old process's registrations went away with it.
        assert!(manager.topic(&name("/t")).is_none());
        assert!(manager.topic(&name("/t2")).is_some());
    }

    #[test]
    fn reregistration_with_same_uri_is_not_a_replacement() {
        let (mut manager, replacements) = manager();
        manager.register_publisher(&name("/n"), "http://host:1/", &name("/t"), "pkg/T");
        manager.register_subscriber(&name("/n"), "http://host:1/", &name("/t2"), "pkg/T");
        assert!(replacements.lock().expect(FAILED_TO_LOCK).is_empty());
        assert!(manager.topic(&name("/t")).is_some());
    }

    #[test]
    fn services_overwrite_by_last_writer() {
        let (mut manager, _) = manager();
        manager.register_service(&name("/a"), "http://host:1/", &name("/s"), "rosrpc://host:11/");
        manager.register_service(&name("/b"), "http://host:2/", &name("/s"), "rosrpc://host:12/");
        assert_eq!(
            Some("rosrpc://host:12/"),
            manager.service_uri(&name("/s"))
        );
        let services: Vec<_> = manager.all_services().collect();
        assert_eq!(1, services.len());
        assert_eq!(&name("/b"), services[0].provider());
        // The displaced provider had nothing else registered and is gone.
        assert!(manager.node_uri(&name("/a")).is_none());
    }

    #[test]
    fn stale_service_unregisters_are_ignored() {
        let (mut manager, _) = manager();
        manager.register_service(&name("/a"), "http://host:1/", &name("/s"), "rosrpc://host:11/");
        assert!(!manager.unregister_service(&name("/a"), &name("/s"), "rosrpc://host:99/"));
        assert_eq!(
            Some("rosrpc://host:11/"),
            manager.service_uri(&name("/s"))
        );
        assert!(manager.unregister_service(&name("/a"), &name("/s"), "rosrpc://host:11/"));
        assert!(manager.service_uri(&name("/s")).is_none());
        assert!(!manager.unregister_service(&name("/a"), &name("/s"), "rosrpc://host:11/"));
    }

    #[test]
    fn message_types_are_advisory() {
        let (mut manager, _) = manager();
        manager.register_publisher(&name("/a"), "http://host:1/", &name("/t"), "pkg/T");
        let info = manager.register_subscriber(&name("/b"), "http://host:2/", &name("/t"), "pkg/Other");
        assert_eq!("pkg/T", info.message_type());
        assert_eq!(2, info.publishers().len() + info.subscribers().len());
    }

    #[test]
    fn wildcard_types_defer_to_concrete_ones() {
        let (mut manager, _) = manager();
        manager.register_subscriber(&name("/a"), "http://host:1/", &name("/t"), "*");
        let info = manager.register_publisher(&name("/b"), "http://host:2/", &name("/t"), "pkg/T");
        assert_eq!("pkg/T", info.message_type());
        let info = manager.register_subscriber(&name("/c"), "http://host:3/", &name("/t"), "*");
        assert_eq!("pkg/T", info.message_type());
    }
}

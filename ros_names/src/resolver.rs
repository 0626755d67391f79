use crate::{Error, GraphName, Result};
use std::collections::HashMap;

/// Resolves names against a global namespace and a remapping table.
///
/// Remappings take priority over structural resolution: both the namespace
/// and the name are looked up in the table before anything is joined.
#[derive(Clone, Debug)]
pub struct NameResolver {
    namespace: GraphName,
    remappings: HashMap<GraphName, GraphName>,
}

impl NameResolver {
    /// Creates a resolver for the given namespace.
    pub fn new(namespace: GraphName, remappings: HashMap<GraphName, GraphName>) -> NameResolver {
        NameResolver {
            namespace,
            remappings,
        }
    }

    /// Creates a resolver for the root namespace with no remappings.
    pub fn root() -> NameResolver {
        NameResolver::new(GraphName::root(), HashMap::new())
    }

    /// The namespace names are resolved against.
    pub fn namespace(&self) -> &GraphName {
        &self.namespace
    }

    /// Resolves a name against this resolver's namespace.
    pub fn resolve(&self, name: &str) -> Result<GraphName> {
        self.resolve_in(&self.namespace, name)
    }

    /// Resolves a name against the given namespace.
    ///
    /// The namespace must be global once remapped. Private names cannot be
    /// resolved here; only a node's own resolver may expand them.
    pub fn resolve_in(&self, namespace: &GraphName, name: &str) -> Result<GraphName> {
        let namespace = self.lookup_remapping(namespace);
        if !namespace.is_global() {
            return Err(Error::NameResolution {
                name: name.into(),
                reason: format!("namespace `{}` is not global", namespace),
            });
        }
        let name = self.lookup_remapping(&name.parse()?);
        if name.is_global() {
            return Ok(name);
        }
        if name.is_private() {
            return Err(Error::NameResolution {
                name: name.to_string(),
                reason: "private `~names` only resolve inside their own node".into(),
            });
        }
        namespace.join(&name)
    }

    /// Creates a resolver for a namespace nested inside this one.
    ///
    /// The child shares this resolver's remapping table.
    pub fn child(&self, name: &str) -> Result<NameResolver> {
        Ok(NameResolver::new(
            self.resolve(name)?,
            self.remappings.clone(),
        ))
    }

    fn lookup_remapping(&self, name: &GraphName) -> GraphName {
        self.remappings.get(name).unwrap_or(name).clone()
    }
}

/// Resolver owned by a single node, able to expand private `~names`.
///
/// `~foo` and `~/foo` both resolve to `<node name>/foo`; everything else is
/// handed to the resolver of the namespace the node lives in.
#[derive(Clone, Debug)]
pub struct NodeNameResolver {
    node_name: GraphName,
    resolver: NameResolver,
}

impl NodeNameResolver {
    /// Creates a resolver for the node with the given global name.
    pub fn new(node_name: GraphName, remappings: HashMap<GraphName, GraphName>) -> Result<Self> {
        if !node_name.is_global() {
            return Err(Error::NameResolution {
                name: node_name.to_string(),
                reason: "node names must be global".into(),
            });
        }
        let namespace = node_name.parent();
        Ok(NodeNameResolver {
            node_name,
            resolver: NameResolver::new(namespace, remappings),
        })
    }

    /// The global name of the owning node.
    pub fn node_name(&self) -> &GraphName {
        &self.node_name
    }

    /// The resolver of the namespace the node lives in.
    pub fn namespace_resolver(&self) -> &NameResolver {
        &self.resolver
    }

    /// Resolves a name, expanding private `~names` inside the node.
    pub fn resolve(&self, name: &str) -> Result<GraphName> {
        let parsed = self.resolver.lookup_remapping(&name.parse()?);
        if parsed.is_private() {
            return self.node_name.join(&parsed.to_relative());
        }
        self.resolver.resolve(name)
    }
}

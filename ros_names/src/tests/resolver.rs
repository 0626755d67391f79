use crate::{GraphName, NameResolver, NodeNameResolver};
use std::collections::HashMap;

fn name(value: &str) -> GraphName {
    value.parse().expect("Unexpected invalid graph name")
}

fn remappings(pairs: &[(&str, &str)]) -> HashMap<GraphName, GraphName> {
    pairs
        .iter()
        .map(|(src, dst)| (name(src), name(dst)))
        .collect()
}

#[test]
fn global_names_resolve_to_themselves() {
    let resolver = NameResolver::new(name("/ns1"), HashMap::new());
    assert_eq!(name("/foo"), resolver.resolve("/foo").expect("Unexpected resolution failure"));
    assert_eq!(
        name("/foo/bar"),
        resolver.resolve("/foo/bar").expect("Unexpected resolution failure")
    );
}

#[test]
fn relative_names_join_the_namespace() {
    let resolver = NameResolver::new(name("/ns1"), HashMap::new());
    assert_eq!(name("/ns1/foo"), resolver.resolve("foo").expect("Unexpected resolution failure"));
    assert_eq!(
        name("/ns1/foo/bar"),
        resolver.resolve("foo/bar").expect("Unexpected resolution failure")
    );
    let root = NameResolver::root();
    assert_eq!(name("/foo"), root.resolve("foo").expect("Unexpected resolution failure"));
}

#[test]
fn private_names_are_rejected() {
    let resolver = NameResolver::new(name("/ns1"), HashMap::new());
    resolver.resolve("~foo").expect_err("Unexpected resolution of a private name");
}

#[test]
fn bad_names_are_rejected() {
    let resolver = NameResolver::root();
    resolver.resolve("foo$").expect_err("Unexpected resolution of an invalid name");
    resolver.resolve("1foo").expect_err("Unexpected resolution of an invalid name");
}

#[test]
fn namespaces_must_be_global() {
    let resolver = NameResolver::new(name("ns1"), HashMap::new());
    resolver.resolve("foo").expect_err("Unexpected resolution in a relative namespace");
}

#[test]
fn remappings_take_priority_over_structure() {
    let resolver = NameResolver::new(name("/ns1"), remappings(&[("foo", "/elsewhere/foo")]));
    assert_eq!(
        name("/elsewhere/foo"),
        resolver.resolve("foo").expect("Unexpected resolution failure")
    );
    // Names without a remapping entry still resolve structurally.
    assert_eq!(name("/ns1/bar"), resolver.resolve("bar").expect("Unexpected resolution failure"));
}

#[test]
fn remapped_relative_names_join_the_namespace() {
    let resolver = NameResolver::new(name("/ns1"), remappings(&[("foo", "other/foo")]));
    assert_eq!(
        name("/ns1/other/foo"),
        resolver.resolve("foo").expect("Unexpected resolution failure")
    );
}

#[test]
fn remapped_namespaces_must_stay_global() {
    let resolver = NameResolver::new(name("/ns1"), remappings(&[("/ns1", "relative_ns")]));
    resolver.resolve("foo").expect_err("Unexpected resolution in a remapped relative namespace");
}

#[test]
fn child_resolvers_nest_namespaces() {
    let resolver = NameResolver::new(name("/ns1"), HashMap::new());
    let child = resolver.child("sub").expect("Unexpected child resolver failure");
    assert_eq!(&name("/ns1/sub"), child.namespace());
    assert_eq!(name("/ns1/sub/foo"), child.resolve("foo").expect("Unexpected resolution failure"));
}

#[test]
fn node_resolver_expands_private_names() {
    let resolver = NodeNameResolver::new(name("/ns1/node"), HashMap::new())
        .expect("Unexpected node resolver failure");
    assert_eq!(
        name("/ns1/node/foo"),
        resolver.resolve("~foo").expect("Unexpected resolution failure")
    );
    assert_eq!(
        name("/ns1/node/foo"),
        resolver.resolve("~/foo").expect("Unexpected resolution failure")
    );
    assert_eq!(
        name("/ns1/node/foo/bar"),
        resolver.resolve("~foo/bar").expect("Unexpected resolution failure")
    );
}

#[test]
fn node_resolver_delegates_other_names() {
    let resolver = NodeNameResolver::new(name("/ns1/node"), HashMap::new())
        .expect("Unexpected node resolver failure");
    assert_eq!(name("/ns1/foo"), resolver.resolve("foo").expect("Unexpected resolution failure"));
    assert_eq!(name("/foo"), resolver.resolve("/foo").expect("Unexpected resolution failure"));
}

#[test]
fn node_resolver_honors_remappings() {
    let resolver = NodeNameResolver::new(
        name("/ns1/node"),
        remappings(&[("~foo", "/global/foo"), ("bar", "~bar")]),
    )
    .expect("Unexpected node resolver failure");
    assert_eq!(
        name("/global/foo"),
        resolver.resolve("~foo").expect("Unexpected resolution failure")
    );
    assert_eq!(
        name("/ns1/node/bar"),
        resolver.resolve("bar").expect("Unexpected resolution failure")
    );
}

#[test]
fn node_resolver_requires_global_node_names() {
    NodeNameResolver::new(name("node"), HashMap::new())
        .expect_err("Unexpected resolver for a relative node name");
}

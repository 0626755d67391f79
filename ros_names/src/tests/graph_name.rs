use crate::GraphName;

fn name(value: &str) -> GraphName {
    value.parse().expect("Unexpected invalid graph name")
}

#[test]
fn names_follow_the_character_rules() {
    name("/foo");
    name("/foo/bar");
    name("/f1_aA/Ba02/Xx");
    name("foo");
    name("foo/bar");
    name("~foo");
    name("~foo/bar");
    name("/");
    name("");
    "123".parse::<GraphName>().expect_err("Unexpected valid graph name");
    "_foo".parse::<GraphName>().expect_err("Unexpected valid graph name");
    "/foo$".parse::<GraphName>().expect_err("Unexpected valid graph name");
    "foo bar".parse::<GraphName>().expect_err("Unexpected valid graph name");
    "/foo.bar".parse::<GraphName>().expect_err("Unexpected valid graph name");
}

#[test]
fn trailing_slashes_are_stripped() {
    assert_eq!("/foo", name("/foo/").as_str());
    assert_eq!("/foo/bar", name("/foo/bar/").as_str());
    assert_eq!("foo", name("foo/").as_str());
    assert_eq!("/", name("/").as_str());
}

#[test]
fn private_spellings_are_folded() {
    assert_eq!("~foo", name("~/foo").as_str());
    assert_eq!("~foo/bar", name("~/foo/bar").as_str());
    assert_eq!("~", name("~/").as_str());
}

#[test]
fn canonicalization_is_idempotent() {
    for raw in &["/foo/", "~/foo", "/a/b/c", "foo/bar/", "~x/y/", "/", ""] {
        let once = name(raw);
        let twice = once.as_str().parse::<GraphName>().expect("Unexpected invalid graph name");
        assert_eq!(once, twice);
    }
}

#[test]
fn exactly_one_classification_holds() {
    let cases = [
        ("/foo/bar", true, false, false),
        ("foo/bar", false, false, true),
        ("~foo", false, true, false),
        ("/", true, false, false),
    ];
    for (raw, global, private, relative) in &cases {
        let value = name(raw);
        assert_eq!(*global, value.is_global(), "{}", raw);
        assert_eq!(*private, value.is_private(), "{}", raw);
        assert_eq!(*relative, value.is_relative(), "{}", raw);
    }
    assert!(name("/").is_root());
    assert!(!name("/foo").is_root());
    assert!(name("").is_empty());
    assert!(!name("foo").is_empty());
}

#[test]
fn parents_are_namespaces() {
    assert_eq!(name("/foo"), name("/foo/bar").parent());
    assert_eq!(name("/f1_aA/Ba02"), name("/f1_aA/Ba02/Xx").parent());
    assert_eq!(name("/"), name("/foo").parent());
    assert_eq!(name("a"), name("a/b").parent());
    assert_eq!(name(""), name("foo").parent());
    assert_eq!(name("~a"), name("~a/b").parent());
    assert_eq!(name("/"), name("/").parent());
    assert_eq!(name(""), name("").parent());
}

#[test]
fn basenames_drop_the_namespace() {
    assert_eq!(name("bar"), name("/foo/bar").basename());
    assert_eq!(name("bar"), name("foo/bar").basename());
    assert_eq!(name("b"), name("~a/b").basename());
    assert_eq!(name("foo"), name("foo").basename());
}

#[test]
fn global_conversion_adds_the_root() {
    assert_eq!(name("/foo"), name("foo").to_global());
    assert_eq!(name("/foo"), name("/foo").to_global());
    assert_eq!(name("/foo/bar"), name("~foo/bar").to_global());
    assert_eq!(name("/"), name("").to_global());
}

#[test]
fn relative_conversion_strips_markers() {
    assert_eq!(name("foo"), name("/foo").to_relative());
    assert_eq!(name("foo"), name("~foo").to_relative());
    assert_eq!(name("foo"), name("foo").to_relative());
}

#[test]
fn join_concatenates_namespaces() {
    assert_eq!(
        name("/foo/bar/baz"),
        name("/foo").join(&name("bar/baz")).expect("Unexpected join failure")
    );
    assert_eq!(
        name("a/b"),
        name("a").join(&name("b")).expect("Unexpected join failure")
    );
}

#[test]
fn join_short_circuits_on_global_names() {
    let cases = ["/foo", "foo/bar", "~x", "/", ""];
    for raw in &cases {
        let lhs = name(raw);
        assert_eq!(
            name("/other"),
            lhs.join(&name("/other")).expect("Unexpected join failure"),
            "{}",
            raw
        );
    }
}

#[test]
fn join_onto_root_and_empty() {
    let g = name("foo/bar");
    assert_eq!(
        g.to_global(),
        name("/").join(&g).expect("Unexpected join failure")
    );
    assert_eq!(g, name("").join(&g).expect("Unexpected join failure"));
    assert_eq!(name("/foo"), name("/foo").join(&name("")).expect("Unexpected join failure"));
}

#[test]
fn join_rejects_private_names() {
    name("/foo")
        .join(&name("~bar"))
        .expect_err("Unexpected join of a private name");
}

#[test]
fn serializes_as_a_plain_string() {
    let value = serde_json::to_value(name("/foo/bar")).expect("Unexpected serialization failure");
    assert_eq!(serde_json::json!("/foo/bar"), value);
    let back: GraphName =
        serde_json::from_value(value).expect("Unexpected deserialization failure");
    assert_eq!(name("/foo/bar"), back);
    serde_json::from_value::<GraphName>(serde_json::json!("bad name"))
        .expect_err("Unexpected valid graph name");
}

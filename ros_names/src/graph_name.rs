use crate::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const ROOT: &str = "/";

/// Canonical name of a resource inside the computation graph.
///
/// A graph name is global (`/a/b`), private (`~a/b`) or relative (`a/b`).
/// The empty name is allowed and stands for "unset". Values are kept in
/// canonical form: no trailing slash except for the root itself, and the
/// `~/a` spelling of private names is folded into `~a`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GraphName {
    name: String,
}

/// Checks whether a string follows the graph resource naming rules.
///
/// Valid names start with `~`, `/` or a letter and contain only letters,
/// digits, underscores and slashes. The empty string is valid.
pub fn is_valid_name(name: &str) -> bool {
    lazy_static! {
        static ref RE_NAME_CHAR_SET: Regex = Regex::new("^[~/A-Za-z][A-Za-z0-9_/]*$").unwrap();
    }
    name.is_empty() || RE_NAME_CHAR_SET.is_match(name)
}

impl GraphName {
    /// Creates a graph name, with naming rules checked and the value
    /// brought into canonical form.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(Error::InvalidName {
                name,
                reason: "only letters, digits, underscores and slashes are allowed, \
                         with a leading `~`, `/` or letter"
                    .into(),
            });
        }
        Ok(Self {
            name: canonicalize(&name),
        })
    }

    /// The root namespace `/`.
    pub fn root() -> Self {
        Self { name: ROOT.into() }
    }

    /// The empty "unset" name.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
        }
    }

    /// Borrows the canonical string form.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// True for `/`-prefixed names.
    pub fn is_global(&self) -> bool {
        self.name.starts_with('/')
    }

    /// True for `~`-prefixed names.
    pub fn is_private(&self) -> bool {
        self.name.starts_with('~')
    }

    /// True for names that are neither global nor private.
    pub fn is_relative(&self) -> bool {
        !self.is_global() && !self.is_private()
    }

    /// True for the root namespace `/`.
    pub fn is_root(&self) -> bool {
        self.name == ROOT
    }

    /// True for the empty "unset" name.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// The namespace this name lives in.
    ///
    /// The root and the empty name are their own parents. A single-segment
    /// global name has the root as its parent, a single-segment relative or
    /// private name the empty name.
    pub fn parent(&self) -> GraphName {
        if self.is_empty() || self.is_root() {
            return self.clone();
        }
        match self.name.rfind('/') {
            None => GraphName::empty(),
            Some(0) => GraphName::root(),
            Some(idx) => GraphName {
                name: self.name[..idx].into(),
            },
        }
    }

    /// The final segment of the name, without its namespace.
    pub fn basename(&self) -> GraphName {
        match self.name.rfind('/') {
            None => self.clone(),
            Some(idx) => GraphName {
                name: self.name[idx + 1..].into(),
            },
        }
    }

    /// Strips the global or private marker, leaving a relative name.
    pub fn to_relative(&self) -> GraphName {
        if self.is_global() || self.is_private() {
            GraphName {
                name: self.name[1..].into(),
            }
        } else {
            self.clone()
        }
    }

    /// Prefixes the name with the root namespace if it is missing.
    ///
    /// No namespace is taken into account. Private names turn into global
    /// ones with the same segments.
    pub fn to_global(&self) -> GraphName {
        if self.is_global() {
            self.clone()
        } else {
            GraphName {
                name: format!("/{}", self.to_relative().name),
            }
        }
    }

    /// Joins another name onto this one.
    ///
    /// A global `other` is absolute and short-circuits the join. Joining
    /// onto the empty name yields `other` itself, joining onto the root
    /// yields `other` as a global name. A private `other` cannot be joined
    /// onto a non-empty namespace and is rejected.
    pub fn join(&self, other: &GraphName) -> Result<GraphName> {
        if other.is_global() || self.is_empty() {
            return Ok(other.clone());
        }
        if self.is_root() {
            return Ok(other.to_global());
        }
        if other.is_private() {
            return Err(Error::InvalidName {
                name: format!("{}/{}", self.name, other.name),
                reason: "a private `~name` cannot be appended to a namespace".into(),
            });
        }
        Ok(GraphName {
            name: canonicalize(&format!("{}/{}", self.name, other.name)),
        })
    }
}

/// Brings a valid name into canonical form.
fn canonicalize(name: &str) -> String {
    let mut name = name;
    while name != ROOT && name.ends_with('/') {
        name = &name[..name.len() - 1];
    }
    if let Some(stripped) = name.strip_prefix("~/") {
        return format!("~{}", stripped);
    }
    name.into()
}

impl Display for GraphName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for GraphName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl<'a> TryFrom<&'a str> for GraphName {
    type Error = Error;

    fn try_from(value: &'a str) -> Result<Self> {
        Self::new(value)
    }
}

impl Serialize for GraphName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for GraphName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        GraphName::new(name).map_err(serde::de::Error::custom)
    }
}

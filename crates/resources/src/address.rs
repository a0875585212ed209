use std::fmt::{Display, Formatter};

/// Which top-level block of the engine configuration a descriptor lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    Provider,
    Data,
    Resource,
}

/// Engine address of a declared descriptor, e.g.
/// `google_pubsub_topic.transformer_queue` or `data.google_project.project`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub block: BlockKind,
    pub kind: String,
    pub name: String,
}

impl Address {
    pub fn resource(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            block: BlockKind::Resource,
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn data(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            block: BlockKind::Data,
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn provider(kind: impl Into<String>) -> Self {
        Self {
            block: BlockKind::Provider,
            kind: kind.into(),
            name: "default".to_string(),
        }
    }

    /// Reference to an attribute this descriptor exports once applied.
    /// `path` may index nested blocks, e.g. `service_config[0].uri`.
    pub fn attr(&self, path: impl Into<String>) -> Reference {
        Reference {
            address: self.clone(),
            attribute: path.into(),
        }
    }

    /// Parse `type.name` or `data.type.name`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("data"), Some(kind), Some(name), None) => Some(Self::data(kind, name)),
            (Some(kind), Some(name), None, None) => Some(Self::resource(kind, name)),
            _ => None,
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.block {
            BlockKind::Provider => write!(f, "provider.{}", self.kind),
            BlockKind::Data => write!(f, "data.{}.{}", self.kind, self.name),
            BlockKind::Resource => write!(f, "{}.{}", self.kind, self.name),
        }
    }
}

/// An interpolation of another descriptor's generated attribute. Renders as
/// `${type.name.attribute}` and is resolved by the engine at apply time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub address: Address,
    pub attribute: String,
}

impl Reference {
    /// The interpolation embedded in a larger string, e.g.
    /// `serviceAccount:${google_service_account.runner.email}`.
    pub fn prefixed(&self, prefix: &str) -> String {
        format!("{prefix}{self}")
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "${{{}.{}}}", self.address, self.attribute)
    }
}

impl From<Reference> for String {
    fn from(value: Reference) -> Self {
        value.to_string()
    }
}

impl From<&Reference> for String {
    fn from(value: &Reference) -> Self {
        value.to_string()
    }
}

/// Escape the engine's template openers (`${` and `%{`) so a configured
/// string is emitted verbatim instead of being interpolated.
pub fn literal(value: &str) -> String {
    value.replace("${", "$${").replace("%{", "%%{")
}

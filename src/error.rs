use std::fmt;

use thiserror::Error;

/// Failures surfaced by instance construction and property access.
#[derive(Error, Debug)]
pub enum Error {
    /// The key is neither a data nor a computed property of the instance
    #[error("property `{key}` is not defined on the instance")]
    PropertyNotFound { key: String },

    /// Mounting found no element for the configured selector
    #[error("no render surface matches selector `{selector}`")]
    RenderSurfaceNotFound { selector: String },

    /// `data`, or what the data factory returned, is not an object
    #[error("data must be an object, got {found}")]
    InvalidData { found: &'static str },

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn property_not_found(key: &str) -> Self {
        Error::PropertyNotFound {
            key: key.to_string(),
        }
    }
}

/// Non-fatal conditions. They are handed to the configured warn handler and
/// never interrupt the operation that raised them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    /// A computed property declared without a setter was assigned to.
    ComputedWithoutSetter { target: String, key: String },
    /// A template referenced a property the instance does not define.
    UnknownProperty { key: String },
    /// A computed property reuses a data key and was not installed.
    ComputedShadowsData { key: String },
}

impl Warning {
    pub fn key(&self) -> &str {
        match self {
            Warning::ComputedWithoutSetter { key, .. }
            | Warning::UnknownProperty { key }
            | Warning::ComputedShadowsData { key } => key,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ComputedWithoutSetter { target, key } => {
                write!(f, "{target} has no setter for computed property `{key}`")
            }
            Warning::UnknownProperty { key } => write!(
                f,
                "property `{key}` is not defined on the instance but referenced during render"
            ),
            Warning::ComputedShadowsData { key } => {
                write!(f, "computed property `{key}` is already defined in data")
            }
        }
    }
}

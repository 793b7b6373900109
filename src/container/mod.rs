use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// A container identifier as reported by the runtime.
///
/// The runtime owns the id format; it is kept verbatim, including an empty id.
/// Cheap to clone. Maps keyed by `ContainerID` can be queried with a plain `&str`.
///
/// # Examples
///
/// ```
/// # use std::collections::HashMap;
/// # use cri_stats::container::ContainerID;
/// let id = ContainerID::new("4c2ab0e1f3d9");
/// let mut seen = HashMap::new();
/// seen.insert(id, 1);
/// assert_eq!(seen.get("4c2ab0e1f3d9"), Some(&1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    pub fn new(src: impl AsRef<str>) -> Self {
        Self(src.as_ref().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContainerID {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for ContainerID {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for ContainerID {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

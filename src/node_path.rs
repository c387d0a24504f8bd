//! Array paths.
//!
//! A [`NodePath`] locates an array within a store: `/`-rooted, with
//! non-empty path segments. The metadata document and chunk keys of an array
//! all live under its path.

use derive_more::Display;
use thiserror::Error;

/// An invalid node path.
#[derive(Clone, Debug, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

/// The path of an array within a store.
///
/// The root path is `/`; any other path is `/`-rooted with non-empty,
/// non-dot segments and no trailing `/`.
#[derive(Clone, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodePath(String);

impl NodePath {
    /// Create a new node path from `path`.
    ///
    /// # Errors
    /// Returns [`NodePathError`] if `path` is not valid.
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if path == "/" {
            return Ok(Self(path.to_string()));
        }
        let valid = path.starts_with('/')
            && !path.ends_with('/')
            && path[1..]
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if valid {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// Create the root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// The path as a string, including the leading `/`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path_valid() {
        assert!(NodePath::new("/").is_ok());
        assert!(NodePath::new("/a").is_ok());
        assert!(NodePath::new("/a/bb/c").is_ok());
    }

    #[test]
    fn node_path_invalid() {
        assert!(NodePath::new("").is_err());
        assert!(NodePath::new("a").is_err());
        assert!(NodePath::new("/a/").is_err());
        assert!(NodePath::new("/a//b").is_err());
        assert!(NodePath::new("/a/../b").is_err());
    }
}

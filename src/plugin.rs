//! The plugin registry.
//!
//! [`Plugin`]s are registered at compile time with [`inventory`] and resolved
//! by name at runtime. A name with no registered plugin fails closed with
//! [`PluginCreateError::Unsupported`]; data written with an unknown codec is
//! never silently passed through.

use thiserror::Error;

use crate::metadata::{ConfigurationInvalidError, Metadata};

/// A plugin: a named constructor for some extension point (such as a codec).
pub struct Plugin<TPlugin> {
    /// The identifier of the plugin.
    identifier: &'static str,
    /// Tests if the name is a match for this plugin.
    match_name_fn: fn(name: &str) -> bool,
    /// Create an implementation of this plugin from metadata.
    create_fn: fn(metadata: &Metadata) -> Result<TPlugin, PluginCreateError>,
}

/// A plugin creation error.
#[derive(Debug, Error)]
pub enum PluginCreateError {
    /// No plugin with a matching name is registered.
    #[error("{plugin_type} {name} is not supported")]
    Unsupported {
        /// The name of the unsupported plugin.
        name: String,
        /// The plugin type (e.g. "codec").
        plugin_type: String,
    },
    /// Invalid plugin configuration.
    #[error(transparent)]
    ConfigurationInvalid(#[from] ConfigurationInvalidError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for PluginCreateError {
    fn from(error_str: &str) -> Self {
        Self::Other(error_str.to_string())
    }
}

impl From<String> for PluginCreateError {
    fn from(error_str: String) -> Self {
        Self::Other(error_str)
    }
}

impl<TPlugin> Plugin<TPlugin> {
    /// Create a new plugin for registration.
    pub const fn new(
        identifier: &'static str,
        match_name_fn: fn(name: &str) -> bool,
        create_fn: fn(metadata: &Metadata) -> Result<TPlugin, PluginCreateError>,
    ) -> Self {
        Self {
            identifier,
            match_name_fn,
            create_fn,
        }
    }

    /// Create an implementation of this plugin from `metadata`.
    ///
    /// # Errors
    /// Returns a [`PluginCreateError`] if plugin creation fails due to either:
    ///  - metadata name being unregistered,
    ///  - or the configuration is invalid.
    pub fn create(&self, metadata: &Metadata) -> Result<TPlugin, PluginCreateError> {
        (self.create_fn)(metadata)
    }

    /// Returns true if this plugin is associated with `name`.
    #[must_use]
    pub fn match_name(&self, name: &str) -> bool {
        (self.match_name_fn)(name)
    }

    /// Returns the identifier of the plugin.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        self.identifier
    }
}

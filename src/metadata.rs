//! Named, configured metadata records.
//!
//! A [`Metadata`] is a name with an optional JSON configuration object. It is
//! the self-describing form of a codec in an array's metadata document: the
//! name resolves an implementation through the plugin registry and the
//! configuration parameterizes it.
//!
//! A metadata record serializes as either a plain string (no configuration)
//! or an object:
//! ```json
//! "crc32c"
//! ```
//! ```json
//! { "name": "gzip", "configuration": { "level": 5 } }
//! ```

use serde::{
    de::{DeserializeOwned, Deserializer},
    ser::SerializeMap,
    Deserialize, Serialize, Serializer,
};
use thiserror::Error;

/// A metadata configuration: an arbitrary JSON object.
pub type MetadataConfiguration = serde_json::Map<String, serde_json::Value>;

/// Unknown fields of a metadata document, preserved across rewrite.
///
/// An unknown field whose value is an object containing
/// `"must_understand": true` marks a required extension and must fail
/// parsing; [`validate_additional_fields`] performs that check.
pub type AdditionalFields = serde_json::Map<String, serde_json::Value>;

/// A name with an optional configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Metadata {
    name: String,
    configuration: Option<MetadataConfiguration>,
}

impl std::fmt::Display for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(configuration) = &self.configuration {
            write!(
                f,
                "{} {}",
                self.name,
                serde_json::to_string(configuration).unwrap_or_default()
            )
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match &self.configuration {
            Some(configuration) if !configuration.is_empty() => {
                let mut map = s.serialize_map(Some(2))?;
                map.serialize_entry("name", &self.name)?;
                map.serialize_entry("configuration", configuration)?;
                map.end()
            }
            _ => s.serialize_str(self.name.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum MetadataIntermediate {
            Name(String),
            NameAndConfiguration {
                name: String,
                #[serde(default)]
                configuration: Option<MetadataConfiguration>,
            },
        }

        let metadata = MetadataIntermediate::deserialize(d).map_err(|_| {
            serde::de::Error::custom("expected a name or a {name, configuration} object")
        })?;
        match metadata {
            MetadataIntermediate::Name(name) => Ok(Self {
                name,
                configuration: None,
            }),
            MetadataIntermediate::NameAndConfiguration {
                name,
                configuration,
            } => Ok(Self {
                name,
                configuration,
            }),
        }
    }
}

impl Metadata {
    /// Create metadata from `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            configuration: None,
        }
    }

    /// Create metadata from `name` and `configuration`.
    #[must_use]
    pub fn new_with_configuration(name: &str, configuration: MetadataConfiguration) -> Self {
        Self {
            name: name.into(),
            configuration: Some(configuration),
        }
    }

    /// Create metadata from `name` and a serializable `configuration`.
    ///
    /// # Errors
    /// Returns [`ConfigurationInvalidError`] if `configuration` cannot be
    /// converted to a JSON object.
    pub fn new_with_serializable_configuration<TConfiguration: Serialize>(
        name: &str,
        configuration: &TConfiguration,
    ) -> Result<Self, ConfigurationInvalidError> {
        match serde_json::to_value(configuration) {
            Ok(serde_json::Value::Object(configuration)) => {
                Ok(Self::new_with_configuration(name, configuration))
            }
            _ => Err(ConfigurationInvalidError::new(name.to_string(), None)),
        }
    }

    /// Convert the configuration to a concrete configuration type.
    ///
    /// An absent configuration is treated as an empty object, so
    /// configuration types with defaults for every field parse from bare
    /// names.
    ///
    /// # Errors
    /// Returns [`ConfigurationInvalidError`] if the configuration cannot be
    /// deserialized into `TConfiguration`.
    pub fn to_configuration<TConfiguration: DeserializeOwned>(
        &self,
    ) -> Result<TConfiguration, ConfigurationInvalidError> {
        let configuration = self.configuration.clone().unwrap_or_default();
        let value = serde_json::Value::Object(configuration);
        serde_json::from_value(value)
            .map_err(|_| ConfigurationInvalidError::new(self.name.clone(), self.configuration()))
    }

    /// Returns the metadata name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a copy of the configuration, if any.
    #[must_use]
    pub fn configuration(&self) -> Option<MetadataConfiguration> {
        self.configuration.clone()
    }
}

/// An invalid configuration for a named metadata record.
#[derive(Clone, Debug, Error)]
#[error("{name} is not configured correctly: {configuration:?}")]
pub struct ConfigurationInvalidError {
    name: String,
    configuration: Option<MetadataConfiguration>,
}

impl ConfigurationInvalidError {
    /// Create a new [`ConfigurationInvalidError`].
    #[must_use]
    pub fn new(name: String, configuration: Option<MetadataConfiguration>) -> Self {
        Self {
            name,
            configuration,
        }
    }

    /// Returns the name of the metadata record.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Check `additional_fields` for required extensions.
///
/// # Errors
/// Returns the name of the first field whose value is an object containing
/// `"must_understand": true`.
pub fn validate_additional_fields(additional_fields: &AdditionalFields) -> Result<(), String> {
    for (name, value) in additional_fields {
        if let Some(must_understand) = value.get("must_understand") {
            if must_understand == &serde_json::Value::Bool(true) {
                return Err(name.clone());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_from_name() {
        let metadata: Metadata = serde_json::from_str(r#""crc32c""#).unwrap();
        assert_eq!(metadata.name(), "crc32c");
        assert!(metadata.configuration().is_none());
        assert_eq!(serde_json::to_string(&metadata).unwrap(), r#""crc32c""#);
    }

    #[test]
    fn metadata_from_name_and_configuration() {
        let json = r#"{"name":"gzip","configuration":{"level":5}}"#;
        let metadata: Metadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.name(), "gzip");
        assert!(metadata.configuration().is_some());
        assert_eq!(serde_json::to_string(&metadata).unwrap(), json);
    }

    #[test]
    fn metadata_to_configuration() {
        #[derive(Deserialize)]
        struct GzipConfiguration {
            level: u32,
        }
        let metadata: Metadata =
            serde_json::from_str(r#"{"name":"gzip","configuration":{"level":5}}"#).unwrap();
        let configuration = metadata.to_configuration::<GzipConfiguration>().unwrap();
        assert_eq!(configuration.level, 5);
    }

    #[test]
    fn metadata_invalid() {
        assert!(serde_json::from_str::<Metadata>(r#"{"configuration":{}}"#).is_err());
    }

    #[test]
    fn additional_fields_must_understand() {
        let mut fields = AdditionalFields::default();
        fields.insert("benign".to_string(), serde_json::json!({"x": 1}));
        assert!(validate_additional_fields(&fields).is_ok());
        fields.insert(
            "required_extension".to_string(),
            serde_json::json!({"must_understand": true}),
        );
        assert_eq!(
            validate_additional_fields(&fields),
            Err("required_extension".to_string())
        );
    }
}

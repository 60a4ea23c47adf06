//! Plugin descriptors as they appear in site.yml

use serde::{Deserialize, Deserializer, Serialize};

/// A named plugin plus its options record.
///
/// Accepts either a bare name (`- plugin-offline`) or a mapping with
/// `resolve` and an optional `options` mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginDescriptor {
    pub resolve: String,
    pub options: serde_yaml::Value,
}

impl PluginDescriptor {
    pub fn new(resolve: &str) -> Self {
        Self {
            resolve: resolve.to_string(),
            options: empty_options(),
        }
    }

    pub fn with_options(resolve: &str, options: serde_yaml::Value) -> Self {
        Self {
            resolve: resolve.to_string(),
            options,
        }
    }

    /// Name with the `gatsby-` prefix removed
    pub fn name(&self) -> &str {
        normalize_name(&self.resolve)
    }
}

/// Strip the framework prefix so both `gatsby-plugin-feed` and `plugin-feed` resolve
pub fn normalize_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix("gatsby-").unwrap_or(name)
}

fn empty_options() -> serde_yaml::Value {
    serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
}

impl<'de> Deserialize<'de> for PluginDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Name(String),
            Full {
                resolve: String,
                #[serde(default)]
                options: Option<serde_yaml::Value>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Name(resolve) => PluginDescriptor::new(&resolve),
            Raw::Full { resolve, options } => PluginDescriptor {
                resolve,
                options: match options {
                    Some(serde_yaml::Value::Null) | None => empty_options(),
                    Some(value) => value,
                },
            },
        })
    }
}

use crate::state::{Data, ResourceTable};
use crate::StateError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// One pending intent to fetch `to`, attributed to the page that referenced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub to: String,
    pub from: Option<String>,
}

impl QueueEntry {
    pub fn new(to: impl Into<String>, from: Option<String>) -> Self {
        Self {
            to: to.into(),
            from,
        }
    }
}

/// Everything needed to resume a paused crawl
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub queue: Vec<QueueEntry>,
    pub resources: ResourceTable,
    #[serde(default)]
    pub data: Data,
}

impl EngineState {
    /// Serializes the state as a JSON document
    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a JSON state document
    pub fn from_json(content: &str) -> Result<Self, StateError> {
        let state: Self = serde_json::from_str(content)?;
        state.validate()?;
        Ok(state)
    }

    /// Writes the state to `path`
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads a state previously written by [`EngineState::save`]
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Checks that every URL in the state could have been produced by the engine
    pub fn validate(&self) -> Result<(), StateError> {
        for entry in &self.queue {
            check_absolute(&entry.to)?;
        }

        for (key, resource) in self.resources.iter() {
            check_absolute(key)?;
            if resource.url != key {
                return Err(StateError::Invalid(format!(
                    "resource stored under '{}' has url '{}'",
                    key, resource.url
                )));
            }
            if resource.from.is_empty() {
                return Err(StateError::Invalid(format!(
                    "resource '{}' has no referrer",
                    key
                )));
            }
        }

        Ok(())
    }
}

/// What a finished crawl produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalPayload {
    pub resources: ResourceTable,
    pub data: Data,
}

impl FinalPayload {
    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the payload to `path`
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads a payload previously written by [`FinalPayload::save`]
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn check_absolute(url: &str) -> Result<(), StateError> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(parsed) => Err(StateError::Invalid(format!(
            "'{}' has unsupported scheme '{}'",
            url,
            parsed.scheme()
        ))),
        Err(e) => Err(StateError::Invalid(format!("'{}' is not absolute: {}", url, e))),
    }
}

//! OCR engine implementations
//!
//! This module contains implementations of the OcrEngine trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

#[cfg(any(feature = "engine-ocrs", feature = "engine-leptess"))]
mod models;

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use serde::Serialize;
use std::sync::Arc;

/// Information about an available engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Registry of available OCR engines
pub struct EngineRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
    default_engine: String,
}

impl EngineRegistry {
    /// Create a new engine registry with all available engines initialized
    #[allow(unused_variables, unused_mut)]
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let mut engines: Vec<Arc<dyn OcrEngine>> = Vec::new();

        #[cfg(feature = "engine-ocrs")]
        {
            tracing::info!("Initializing ocrs engine...");
            engines.push(Arc::new(ocrs::OcrsEngine::new(config)?));
        }

        #[cfg(feature = "engine-leptess")]
        {
            tracing::info!("Initializing leptess engine...");
            engines.push(Arc::new(leptess::LeptessEngine::new(config)?));
        }

        if engines.is_empty() {
            return Err(OcrError::InitializationError(
                "No OCR engines available. Build with --features engine-ocrs or --features engine-leptess".to_string()
            ));
        }

        Self::from_engines(engines, config.engine.as_deref())
    }

    /// Build a registry from already-constructed engines
    ///
    /// The preferred engine becomes the default when present, otherwise the first one.
    pub fn from_engines(
        engines: Vec<Arc<dyn OcrEngine>>,
        preferred: Option<&str>,
    ) -> Result<Self, OcrError> {
        let first = engines
            .first()
            .map(|e| e.name().to_string())
            .ok_or_else(|| OcrError::InitializationError("No OCR engines registered".to_string()))?;

        let default_engine = match preferred {
            Some(name) if engines.iter().any(|e| e.name() == name) => name.to_string(),
            Some(name) => {
                tracing::warn!("Engine '{}' not available, falling back to '{}'", name, first);
                first
            }
            None => first,
        };

        Ok(Self {
            engines,
            default_engine,
        })
    }

    /// Get an engine by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn OcrEngine>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    /// Get the default engine
    pub fn default_engine(&self) -> Option<Arc<dyn OcrEngine>> {
        self.get(&self.default_engine)
    }

    /// Get the default engine name
    pub fn default_name(&self) -> &str {
        &self.default_engine
    }

    /// Get info about all available engines
    pub fn info(&self) -> Vec<EngineInfo> {
        self.engines
            .iter()
            .map(|e| EngineInfo {
                name: e.name(),
                description: e.description(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedEngine;

    #[test]
    fn test_empty_registry_is_an_error() {
        assert!(EngineRegistry::from_engines(vec![], None).is_err());
    }

    #[test]
    fn test_first_engine_is_default() {
        let registry =
            EngineRegistry::from_engines(vec![Arc::new(ScriptedEngine::new(vec![]))], None).unwrap();
        assert_eq!(registry.default_name(), "scripted");
        assert!(registry.default_engine().is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_unknown_preferred_engine_falls_back() {
        let registry = EngineRegistry::from_engines(
            vec![Arc::new(ScriptedEngine::new(vec![]))],
            Some("leptess"),
        )
        .unwrap();
        assert_eq!(registry.default_name(), "scripted");
        assert_eq!(registry.info()[0].name, "scripted");
    }
}

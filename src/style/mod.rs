//! Per-layer style rules compiled from a style document.
//!
//! A style document contributes one filter per layer; compiling the
//! document turns each into a predicate owned by that layer's rule.

use crate::filter::{AttributeLookup, Predicate, compile_filter};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::path::Path;

/// Raw style document slice (before compilation). Only the pieces the
/// filter compiler consumes; paint/layout properties stay with the host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    pub layers: Vec<LayerConfig>,
}

/// Raw layer entry from the style document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayerConfig {
    pub id: String,
    #[serde(default)]
    pub filter: Option<Json>,
    #[serde(default, rename = "source-layer")]
    pub source_layer: Option<String>,
}

impl StyleConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// A compiled layer rule.
#[derive(Debug, Clone)]
pub struct CompiledLayer {
    pub id: String,
    /// `None` means the layer has no filter and matches every feature.
    pub predicate: Option<Predicate>,
}

impl CompiledLayer {
    pub fn matches<A: AttributeLookup + ?Sized>(&self, attrs: &A) -> bool {
        match &self.predicate {
            Some(predicate) => predicate.evaluate(attrs),
            None => true,
        }
    }
}

/// Compiled rules for a whole style document.
#[derive(Debug, Clone)]
pub struct StyleRules {
    pub layers: Vec<CompiledLayer>,
}

impl StyleRules {
    /// Compile every layer's filter. Fails on the first bad filter with
    /// the layer named; there is no partial result.
    pub fn compile(config: &StyleConfig) -> Result<Self> {
        let mut layers = Vec::with_capacity(config.layers.len());

        for (i, layer) in config.layers.iter().enumerate() {
            let predicate = match &layer.filter {
                Some(filter) => Some(compile_filter(filter).map_err(|e| {
                    anyhow::anyhow!(
                        "error compiling filter for layer '{}' ({} of {}): {}",
                        layer.id,
                        i + 1,
                        config.layers.len(),
                        e
                    )
                })?),
                None => None,
            };

            if let Some(p) = &predicate {
                tracing::debug!("layer '{}' filter: {}", layer.id, p);
            }

            layers.push(CompiledLayer {
                id: layer.id.clone(),
                predicate,
            });
        }

        Ok(StyleRules { layers })
    }

    /// Ids of layers whose predicate accepts the attribute set, in
    /// document order.
    pub fn matching_layers<A: AttributeLookup + ?Sized>(&self, attrs: &A) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|layer| layer.matches(attrs))
            .map(|layer| layer.id.as_str())
            .collect()
    }
}

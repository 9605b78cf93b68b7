use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

use super::http::{build_client, HttpAnalyzer};
use super::Analyzer;
use crate::config::AnalyzerSpec;
use crate::scoring::ModelId;

/// Process-wide mapping from model id to analyzer.
///
/// Built once at startup and shared read-only afterwards, so lookups need no
/// synchronization.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<ModelId, Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build HTTP analyzers for every configured spec, sharing one client.
    pub fn from_specs(specs: &[AnalyzerSpec]) -> Result<Self> {
        let client = build_client()?;

        let mut registry = Self::new();
        for spec in specs {
            let analyzer = HttpAnalyzer::from_spec(client.clone(), spec)
                .with_context(|| format!("Failed to set up analyzer '{}'", spec.id))?;
            registry.register(spec.id.clone(), analyzer);
        }
        Ok(registry)
    }

    /// Register an analyzer, replacing any previous one under the same id.
    pub fn register(&mut self, id: impl Into<ModelId>, analyzer: impl Analyzer + 'static) -> &mut Self {
        self.analyzers.insert(id.into(), Arc::new(analyzer));
        self
    }

    pub fn get(&self, id: &ModelId) -> Option<Arc<dyn Analyzer>> {
        self.analyzers.get(id).cloned()
    }

    pub fn contains(&self, id: &ModelId) -> bool {
        self.analyzers.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<&ModelId> {
        let mut ids: Vec<_> = self.analyzers.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerRegistry")
            .field("models", &self.ids())
            .finish()
    }
}

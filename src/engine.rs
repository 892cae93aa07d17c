// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::ApiCatalog;
use crate::checks::builtin_checks;
use crate::diagnostics::{CheckFailure, Diagnostic};
use crate::registry::CheckRegistry;
use crate::unit::ResolvedUnit;

/// Configuration for the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Rule keys to run. All built-in rules when absent.
    pub rules: Option<Vec<String>>,
    /// Maximum number of nested variable traces per classification.
    pub max_trace_depth: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            rules: None,
            max_trace_depth: 32,
        }
    }
}

impl AnalysisOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing analysis options")
    }

    /// Check if rule filtering is enabled
    pub fn is_rule_filtered(&self) -> bool {
        self.rules.is_some()
    }
}

/// Diagnostics of one unit, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub file: String,
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<CheckFailure>,
}

/// Runs the enabled checks over resolved units.
///
/// An engine holds no per-unit state: the same engine may analyse any number
/// of units, from any number of threads, and analysing a unit twice gives the
/// same result.
pub struct Engine {
    registry: CheckRegistry,
    catalog: ApiCatalog,
    options: AnalysisOptions,
}

impl Engine {
    /// Engine running every built-in check with the built-in catalog.
    pub fn new() -> Result<Self> {
        Self::with_options(AnalysisOptions::default())
    }

    pub fn with_options(options: AnalysisOptions) -> Result<Self> {
        let mut checks = builtin_checks();
        if let Some(rules) = &options.rules {
            for rule in rules {
                if !checks.iter().any(|check| check.metadata().key == rule) {
                    bail!("unknown rule `{rule}`");
                }
            }
            checks.retain(|check| rules.iter().any(|rule| rule == check.metadata().key));
        }
        let registry = CheckRegistry::new(checks)?;
        Ok(Self {
            registry,
            catalog: ApiCatalog::builtin(),
            options,
        })
    }

    /// Add sinks and known calls on top of the built-in catalog.
    pub fn extend_catalog_json(&mut self, json: &str) -> Result<()> {
        self.catalog
            .extend_from_json(json)
            .context("extending api catalog")
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn catalog(&self) -> &ApiCatalog {
        &self.catalog
    }

    /// Keys of the enabled rules.
    pub fn rules(&self) -> Vec<&'static str> {
        self.registry.keys().collect()
    }

    pub fn analyze(&self, unit: &ResolvedUnit) -> AnalysisResult {
        log::debug!(
            "analyzing {} with {} checks",
            unit.file(),
            self.registry.len()
        );
        let output = self
            .registry
            .run(unit, &self.catalog, self.options.max_trace_depth);

        let mut diagnostics = output.diagnostics;
        // Stable: checks sharing a node keep their emission order.
        diagnostics.sort_by_key(|diagnostic| diagnostic.span.start());

        AnalysisResult {
            file: unit.file().to_string(),
            diagnostics,
            failures: output.failures,
        }
    }

    /// Load a unit document from json and analyse it.
    pub fn analyze_json(&self, json: &str) -> Result<AnalysisResult> {
        let unit = ResolvedUnit::from_json(json)?;
        Ok(self.analyze(&unit))
    }
}

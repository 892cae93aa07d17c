// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Known APIs: query sinks, safe accessors and string-building calls.
//!
//! The default catalog is compiled in from `catalog/catalog.json`. Hosts can
//! extend it with their own JSON, e.g. to add vendor-specific sinks.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use serde::Deserialize;
use thiserror::Error;

use crate::semantic::{SemanticModel, TypeId};

const DEFAULT_CATALOG_JSON: &str = include_str!("./catalog/catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`{owner}#{method}` is listed more than once as a {entry}")]
    DuplicateEntry {
        entry: &'static str,
        owner: String,
        method: String,
    },

    #[error("catalog {entry} entry has an empty type or method name")]
    EmptyName { entry: &'static str },
}

#[derive(Debug, Deserialize, Default)]
struct CatalogConfig {
    #[serde(default)]
    sinks: Vec<SinkConfig>,
    #[serde(default)]
    calls: Vec<CallConfig>,
    #[serde(default)]
    constructors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SinkConfig {
    #[serde(rename = "type")]
    ty: String,
    methods: Vec<String>,
    #[serde(default)]
    remediation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallConfig {
    #[serde(rename = "type")]
    ty: String,
    methods: Vec<String>,
    effect: CallEffect,
}

/// What a recognized call does to the value flowing through it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallEffect {
    /// Result never carries external input.
    Safe,
    /// Result is assembled from the receiver and the arguments.
    Propagate,
    /// Appends the arguments to the receiver and returns it.
    Mutate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkSpec {
    pub owner: String,
    pub method: String,
    /// Message used instead of the generic one when the sink has a safer
    /// parameter-binding alternative.
    pub remediation: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ApiCatalog {
    // method name -> entries
    sinks: BTreeMap<String, Vec<SinkSpec>>,
    calls: BTreeMap<String, Vec<(String, CallEffect)>>,
    constructors: BTreeSet<String>,
}

lazy_static! {
    static ref DEFAULT_CATALOG: ApiCatalog = ApiCatalog::from_json(DEFAULT_CATALOG_JSON)
        .expect("failed to load default api catalog");
}

/// `ty` is the type named `fqn` or implements it, possibly indirectly.
fn type_matches(model: &SemanticModel, ty: TypeId, fqn: &str) -> bool {
    let raw = model.erasure(ty);
    model.is_type_named(raw, fqn) || model.implements_interface(raw, fqn)
}

/// Known calls are inherited through superclasses too, e.g. `Enum#name` on a
/// user enum. Owners the model does not know fall back to [`type_matches`].
fn call_owner_matches(model: &SemanticModel, ty: TypeId, fqn: &str) -> bool {
    type_matches(model, ty, fqn)
        || model
            .resolve_type(fqn)
            .is_some_and(|owner| model.is_subtype(ty, owner))
}

fn check_names(entry: &'static str, owner: &str, methods: &[String]) -> Result<(), CatalogError> {
    if owner.trim().is_empty() || methods.iter().any(|m| m.trim().is_empty()) {
        return Err(CatalogError::EmptyName { entry });
    }
    Ok(())
}

impl ApiCatalog {
    /// Catalog compiled into the crate.
    pub fn builtin() -> Self {
        DEFAULT_CATALOG.clone()
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        catalog.extend_from_json(json)?;
        Ok(catalog)
    }

    /// Add the entries of another catalog document. Entries already present
    /// are rejected, in which case the catalog is left unchanged.
    pub fn extend_from_json(&mut self, json: &str) -> Result<(), CatalogError> {
        let config: CatalogConfig = serde_json::from_str(json)?;
        let mut extended = self.clone();
        extended.merge(config)?;
        *self = extended;
        Ok(())
    }

    fn merge(&mut self, config: CatalogConfig) -> Result<(), CatalogError> {
        for sink in config.sinks {
            check_names("sink", &sink.ty, &sink.methods)?;
            for method in sink.methods {
                let entries = self.sinks.entry(method.clone()).or_default();
                if entries.iter().any(|e| e.owner == sink.ty) {
                    return Err(CatalogError::DuplicateEntry {
                        entry: "sink",
                        owner: sink.ty,
                        method,
                    });
                }
                entries.push(SinkSpec {
                    owner: sink.ty.clone(),
                    method,
                    remediation: sink.remediation.clone(),
                });
            }
        }

        for call in config.calls {
            check_names("call", &call.ty, &call.methods)?;
            for method in call.methods {
                let entries = self.calls.entry(method.clone()).or_default();
                if entries.iter().any(|(owner, _)| *owner == call.ty) {
                    return Err(CatalogError::DuplicateEntry {
                        entry: "call",
                        owner: call.ty,
                        method,
                    });
                }
                entries.push((call.ty.clone(), call.effect));
            }
        }

        for ty in config.constructors {
            if ty.trim().is_empty() {
                return Err(CatalogError::EmptyName {
                    entry: "constructor",
                });
            }
            self.constructors.insert(ty);
        }
        Ok(())
    }

    /// Sink matched by a call of `method` on a receiver of type `receiver`.
    pub fn match_sink(
        &self,
        model: &SemanticModel,
        receiver: TypeId,
        method: &str,
    ) -> Option<&SinkSpec> {
        self.sinks
            .get(method)?
            .iter()
            .find(|sink| type_matches(model, receiver, &sink.owner))
    }

    /// Effect of calling `method`, looked up through the receiver type and
    /// then through the type declaring the method.
    pub fn call_effect(
        &self,
        model: &SemanticModel,
        candidates: &[TypeId],
        method: &str,
    ) -> Option<CallEffect> {
        let entries = self.calls.get(method)?;
        candidates.iter().find_map(|ty| {
            entries
                .iter()
                .find(|(owner, _)| call_owner_matches(model, *ty, owner))
                .map(|(_, effect)| *effect)
        })
    }

    /// Whether `new T(args)` yields a value built from `args`.
    pub fn propagates_construction(&self, model: &SemanticModel, ty: TypeId) -> bool {
        let raw = model.erasure(ty);
        self.constructors.contains(&model.type_data(raw).name)
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.values().map(Vec::len).sum()
    }
}

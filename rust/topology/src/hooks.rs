// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-feature property hooks: id promotion and property transform.
//!
//! Lookups are direct map indexing on the feature's `properties` object.
//! Field names are data, never code, so a hostile field name like
//! `eval(danger())` is just an absent key.
//!
//! Both hooks fail closed: the first feature missing the named property
//! counts one field error and disables the hook for every later feature
//! in the same request.

use geo2topo_core::Feature;
use serde_json::{Map, Value};

use crate::options::TopologyOptions;

#[derive(Debug, Clone)]
struct Hook {
    field: String,
    enabled: bool,
}

#[derive(Debug, Clone)]
struct TransformHook {
    fields: Vec<String>,
    enabled: bool,
}

/// Mutable hook state for one upload session, shared across its files.
#[derive(Debug, Clone, Default)]
pub struct PropertyHooks {
    id: Option<Hook>,
    transform: Option<TransformHook>,
    field_errors: u32,
    messages: Vec<String>,
}

/// A property is usable when present and non-null.
fn lookup<'a>(feature: &'a Feature, field: &str) -> Option<&'a Value> {
    feature
        .properties
        .as_ref()
        .and_then(|p| p.get(field))
        .filter(|v| !v.is_null())
}

impl PropertyHooks {
    pub fn from_options(options: &TopologyOptions) -> Self {
        Self {
            id: options.id_property.clone().map(|field| Hook {
                field,
                enabled: true,
            }),
            transform: options.property_transform.clone().map(|fields| TransformHook {
                fields,
                enabled: true,
            }),
            field_errors: 0,
            messages: Vec::new(),
        }
    }

    /// Id for one output geometry: the promoted property when the id hook
    /// is live, otherwise the feature's own id.
    pub fn feature_id(&mut self, feature: &Feature) -> Option<Value> {
        let hook = match self.id.as_mut() {
            Some(hook) if hook.enabled => hook,
            _ => return feature.id.clone(),
        };
        match lookup(feature, &hook.field) {
            Some(value) => Some(value.clone()),
            None => {
                hook.enabled = false;
                self.field_errors += 1;
                self.messages.push(format!(
                    "FIELD PROCESSING ERROR! Invalid id field: properties.{} does not exist in geoJSON",
                    hook.field
                ));
                feature.id.clone()
            }
        }
    }

    /// Reduced properties for one output geometry, or `None` when no
    /// transform is configured (properties are dropped by default).
    pub fn feature_properties(&mut self, feature: &Feature) -> Option<Map<String, Value>> {
        let hook = match self.transform.as_mut() {
            Some(hook) if hook.enabled => hook,
            _ => return None,
        };
        let mut reduced = Map::new();
        let mut first_missing: Option<String> = None;
        for field in &hook.fields {
            match lookup(feature, field) {
                Some(value) => {
                    reduced.insert(field.clone(), value.clone());
                }
                None => {
                    if first_missing.is_none() {
                        first_missing = Some(field.clone());
                    }
                }
            }
        }
        if let Some(field) = first_missing {
            hook.enabled = false;
            self.field_errors += 1;
            self.messages.push(format!(
                "FIELD PROCESSING ERROR! Invalid property-transform field: properties.{} does not exist in geoJSON",
                field
            ));
        }
        Some(reduced)
    }

    /// Field errors accumulated by hook misses.
    pub fn field_errors(&self) -> u32 {
        self.field_errors
    }

    /// Drain accumulated diagnostic messages.
    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

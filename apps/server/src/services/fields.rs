// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Form field processing.
//!
//! Supported fields are dispatched through a handler table; everything
//! else is echoed back verbatim in the response `fields` object. Handlers
//! only ever record property *names* — lookups against feature data
//! happen later as direct map indexing, never any form of evaluation.
//!
//! Fields supported:
//!
//! - `zoomLevel`: quantization via the fixed zoom table
//! - `projection`: stored verbatim, not validated
//! - `verbose`: `"true"` enables construction diagnostics
//! - `id`: feature property to promote to geometry id
//! - `property-transform-fields`: JSON array of properties to retain

use geo2topo_topology::{quantization_for_zoom, TopologyOptions, DEFAULT_QUANTIZATION};
use serde_json::{Map, Value};

/// Mutable field-processing state for one upload session.
#[derive(Debug)]
pub struct FieldState {
    /// Topology options under construction; immutable once the form is
    /// fully drained.
    pub options: TopologyOptions,
    /// Fields echoed back in the response.
    pub echo: Map<String, Value>,
    /// Errors raised while interpreting field values.
    pub field_errors: u32,
}

impl FieldState {
    pub fn new() -> Self {
        let mut echo = Map::new();
        echo.insert("my_reference".to_string(), Value::from(""));
        echo.insert("zoomLevel".to_string(), Value::from(0));
        echo.insert("verbose".to_string(), Value::from(false));
        echo.insert(
            "quantization".to_string(),
            Value::from(DEFAULT_QUANTIZATION),
        );
        Self {
            options: TopologyOptions::default(),
            echo,
            field_errors: 0,
        }
    }
}

impl Default for FieldState {
    fn default() -> Self {
        Self::new()
    }
}

type Handler = fn(&str, &mut FieldState) -> String;

/// Field name to handler. Unlisted fields are echoed with no special
/// handling.
const HANDLERS: &[(&str, Handler)] = &[
    ("zoomLevel", zoom_level),
    ("projection", projection),
    ("verbose", verbose),
    ("id", id),
    ("property-transform-fields", property_transform_fields),
];

/// Process one form field, returning its diagnostic text for the
/// message log.
pub fn process_field(name: &str, value: &str, state: &mut FieldState) -> String {
    let mut text = format!("Field: {}[{}]; ", name, value);
    match HANDLERS.iter().find(|(field, _)| *field == name) {
        Some((_, handler)) => text.push_str(&handler(value, state)),
        None => {
            state
                .echo
                .insert(name.to_string(), Value::from(value.to_string()));
        }
    }
    text
}

fn zoom_level(value: &str, state: &mut FieldState) -> String {
    // Invalid or missing zoom falls through to the default bucket
    let quantization = value
        .trim()
        .parse::<i64>()
        .map(quantization_for_zoom)
        .unwrap_or(DEFAULT_QUANTIZATION);
    state.options.quantization = quantization;
    state
        .echo
        .insert("zoomLevel".to_string(), Value::from(value.to_string()));
    state
        .echo
        .insert("quantization".to_string(), Value::from(quantization));
    format!("quantization set to: {}", quantization)
}

fn projection(value: &str, state: &mut FieldState) -> String {
    state.options.projection = Some(value.to_string());
    state
        .echo
        .insert("projection".to_string(), Value::from(value.to_string()));
    format!("projection set to: {}", value)
}

fn verbose(value: &str, state: &mut FieldState) -> String {
    if value == "true" {
        state.options.verbose = true;
        state.echo.insert("verbose".to_string(), Value::from("true"));
        "verbose mode enabled".to_string()
    } else {
        String::new()
    }
}

fn id(value: &str, state: &mut FieldState) -> String {
    state.options.id_property = Some(value.to_string());
    state
        .echo
        .insert("id".to_string(), Value::from(value.to_string()));
    format!("id field set to: {}", value)
}

fn property_transform_fields(value: &str, state: &mut FieldState) -> String {
    state.echo.insert(
        "property-transform-fields".to_string(),
        Value::from(value.to_string()),
    );
    match serde_json::from_str::<Vec<String>>(value) {
        Ok(fields) => {
            let n = fields.len();
            state.options.property_transform = Some(fields);
            format!("property-transform fields set to: {}; {} field(s)", value, n)
        }
        Err(_) => {
            state.field_errors += 1;
            format!(
                "FIELD PROCESSING ERROR! field [property-transform-fields]: {}; invalid array exception",
                value
            )
        }
    }
}

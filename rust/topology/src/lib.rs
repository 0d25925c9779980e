// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Geo2Topo Topology
//!
//! TopoJSON topology construction for the conversion service.
//!
//! A feature collection is quantized onto a fixed grid (resolution chosen
//! by map tile zoom level), its lines and rings are cut at junction
//! points, and arcs shared between adjacent geometries are stored once
//! and referenced by index. The result is a `Topology` artifact that is
//! typically far smaller than the input GeoJSON.
//!
//! Conversion runs through [`convert`], which pairs the builder with an
//! explicit [`DiagnosticCapture`] under a process-wide guard, records
//! runtime and output size, and on failure reports the captured
//! diagnostics plus a truncated preview of the offending input.

mod arcs;
pub mod build;
pub mod capture;
pub mod convert;
pub mod error;
mod extract;
pub mod hooks;
pub mod model;
pub mod options;

pub use build::topology;
pub use capture::DiagnosticCapture;
pub use convert::{convert, input_preview, FileConversion, PREVIEW_BYTES};
pub use error::{Error, Result};
pub use hooks::PropertyHooks;
pub use model::{QuantizedPoint, TopoGeometry, TopoValue, Topology, Transform};
pub use options::{quantization_for_zoom, TopologyOptions, DEFAULT_QUANTIZATION};

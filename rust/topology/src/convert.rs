// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Guarded topology conversion with diagnostic capture and metrics.
//!
//! The capture hand-off is a process-wide critical section: one
//! conversion holds it at a time, so interleaved diagnostics from
//! concurrent requests cannot corrupt each other's output.

use geo2topo_core::FeatureCollection;
use std::sync::Mutex;
use std::time::Instant;

use crate::build;
use crate::capture::DiagnosticCapture;
use crate::error::{Error, Result};
use crate::hooks::PropertyHooks;
use crate::model::Topology;
use crate::options::TopologyOptions;

static CONVERT_GUARD: Mutex<()> = Mutex::new(());

/// Bytes of input shown in failure diagnostics.
pub const PREVIEW_BYTES: usize = 240;

/// A successful conversion with its diagnostics and metrics.
#[derive(Debug)]
pub struct FileConversion {
    pub topology: Topology,
    /// Diagnostics captured during construction (empty unless verbose).
    pub stderr: String,
    /// Wall-clock seconds spent building the topology.
    pub runtime: f64,
    /// Serialized size of the artifact in bytes.
    pub output_size: usize,
}

/// Convert one parsed collection into a topology.
///
/// `raw_input` is the decompressed upload; on failure its head is echoed
/// back (ASCII, or hex when binary) to aid debugging.
pub fn convert(
    collection: &FeatureCollection,
    options: &TopologyOptions,
    hooks: &mut PropertyHooks,
    raw_input: &[u8],
) -> Result<FileConversion> {
    let _guard = CONVERT_GUARD.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut capture = DiagnosticCapture::new();
    let start = Instant::now();

    let topology = match build::topology(collection, options, hooks, &mut capture) {
        Ok(topology) => topology,
        Err(err) => {
            return Err(Error::TopologyConversionFailed {
                message: err.to_string(),
                preview: input_preview(raw_input),
                stderr: capture.into_string(),
            })
        }
    };
    let runtime = start.elapsed().as_secs_f64();

    let output_size = match serde_json::to_string(&topology) {
        Ok(serialized) => serialized.len(),
        Err(err) => {
            return Err(Error::TopologyConversionFailed {
                message: err.to_string(),
                preview: input_preview(raw_input),
                stderr: capture.into_string(),
            })
        }
    };

    tracing::debug!(
        runtime_s = runtime,
        output_size,
        arcs = topology.arcs.len(),
        "topology conversion complete"
    );

    Ok(FileConversion {
        topology,
        stderr: capture.into_string(),
        runtime,
        output_size,
    })
}

/// Truncated head of the input: as text when pure ASCII, hex otherwise.
pub fn input_preview(data: &[u8]) -> String {
    let head = &data[..data.len().min(PREVIEW_BYTES)];
    if head.is_ascii() {
        String::from_utf8_lossy(head).into_owned()
    } else {
        hex::encode(&data[..data.len().min(PREVIEW_BYTES / 2)])
    }
}

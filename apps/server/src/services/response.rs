// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-file result aggregation into one response.
//!
//! Every file that starts processing gets a positional entry, success or
//! failure, so the file list never has gaps. Field errors dominate: a
//! single field error fails the whole response even when every topology
//! conversion succeeded, because a broken id or property-transform spec
//! invalidates trust in the whole batch.

use axum::http::StatusCode;
use geo2topo_topology::Topology;
use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome of one uploaded file.
#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topojson: Option<Topology>,
    pub topojson_stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topojson_runtime: Option<f64>,
    /// Transferred (compressed) size in bytes.
    pub file_size: usize,
    pub transfer_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncompress_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncompress_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileEntry {
    fn placeholder(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            topojson: None,
            topojson_stderr: String::new(),
            topojson_runtime: None,
            file_size: 0,
            transfer_time: 0.0,
            uncompress_time: None,
            uncompress_size: None,
            error: None,
        }
    }
}

/// Aggregate response for one upload request.
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub no_files: u32,
    pub field_errors: u32,
    pub file_errors: u32,
    pub file_list: Vec<FileEntry>,
    /// Newline-joined diagnostic log.
    pub message: String,
    /// Echoed and derived form fields.
    pub fields: Map<String, Value>,
}

/// Collects per-file outcomes and the diagnostic log.
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    entries: Vec<FileEntry>,
    file_errors: u32,
    messages: Vec<String>,
}

impl ResponseAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line to the diagnostic log.
    pub fn log(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Entry for file `index`, created (with placeholders for any gap
    /// before it) on first access.
    pub fn entry_mut(&mut self, index: usize, file_name: &str) -> &mut FileEntry {
        while self.entries.len() <= index {
            self.entries.push(FileEntry::placeholder(""));
        }
        let entry = &mut self.entries[index];
        if entry.file_name.is_empty() {
            entry.file_name = file_name.to_string();
        }
        entry
    }

    /// Mark file `index` failed and keep its entry in the list.
    pub fn record_failure(&mut self, index: usize, file_name: &str, error: impl Into<String>) {
        let error = error.into();
        self.messages.push(error.clone());
        let entry = self.entry_mut(index, file_name);
        entry.error = Some(error);
        self.file_errors += 1;
    }

    pub fn file_errors(&self) -> u32 {
        self.file_errors
    }

    /// Build the aggregate response. Overall failure (HTTP 500) whenever
    /// any field or file error was recorded.
    pub fn finalize(
        self,
        field_errors: u32,
        fields: Map<String, Value>,
    ) -> (StatusCode, ConvertResponse) {
        let status = if field_errors > 0 || self.file_errors > 0 {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        let response = ConvertResponse {
            no_files: self.entries.len() as u32,
            field_errors,
            file_errors: self.file_errors,
            file_list: self.entries,
            message: self.messages.join("\n"),
            fields,
        };
        (status, response)
    }
}

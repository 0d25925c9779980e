// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Upload session pipeline.
//!
//! One session per POST request. Form fields and assembled file buffers
//! are accepted while the multipart stream drains; files are then
//! processed strictly in order, each running parse and conversion on the
//! blocking pool and completing before the next file starts. Conversion
//! holds a process-wide diagnostic capture, so files are never converted
//! concurrently within or across requests.
//!
//! There is no cancellation once a file starts converting: a dropped
//! connection lets in-flight work finish. The request timeout layer is
//! the only runtime bound.

use axum::http::StatusCode;
use geo2topo_core::{parse_collection, AssembledFile};
use geo2topo_topology::{convert, input_preview, FileConversion, PropertyHooks, TopologyOptions};

use crate::error::ApiError;
use crate::services::fields::{process_field, FieldState};
use crate::services::response::{ConvertResponse, ResponseAggregator};

/// One uploaded file: name plus the assembly outcome (an encoding or
/// decompression failure is carried here and surfaced per file).
pub struct FileUnit {
    pub name: String,
    pub assembled: geo2topo_core::Result<AssembledFile>,
}

/// State of one upload request.
pub struct UploadSession {
    state: FieldState,
    files: Vec<FileUnit>,
    aggregator: ResponseAggregator,
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            state: FieldState::new(),
            files: Vec::new(),
            aggregator: ResponseAggregator::new(),
        }
    }

    /// Process one form field as it arrives.
    pub fn accept_field(&mut self, name: &str, value: &str) {
        let text = process_field(name, value, &mut self.state);
        tracing::debug!(field = name, "processed form field");
        self.aggregator.log(text);
    }

    /// Queue one assembled file for processing.
    pub fn accept_file(&mut self, name: &str, assembled: geo2topo_core::Result<AssembledFile>) {
        self.files.push(FileUnit {
            name: name.to_string(),
            assembled,
        });
    }

    /// Process all queued files sequentially and build the aggregate
    /// response. Options are frozen here: the form is fully drained.
    pub async fn process(mut self) -> Result<(StatusCode, ConvertResponse), ApiError> {
        let options = self.state.options.clone();
        let mut hooks = PropertyHooks::from_options(&options);
        let files = std::mem::take(&mut self.files);

        for (index, unit) in files.into_iter().enumerate() {
            let no = index + 1;
            self.aggregator
                .log(format!("Processing File [{}]: {}", no, unit.name));
            self.aggregator.entry_mut(index, &unit.name);

            let file = match unit.assembled {
                Ok(file) => file,
                Err(err) => {
                    tracing::warn!(file = %unit.name, error = %err, "file assembly failed");
                    self.aggregator.record_failure(
                        index,
                        &unit.name,
                        format!("FAIL! File [{}]: {}; {}", no, unit.name, err),
                    );
                    continue;
                }
            };

            {
                let entry = self.aggregator.entry_mut(index, &unit.name);
                entry.file_size = file.file_size;
                entry.transfer_time = file.transfer_time;
                entry.uncompress_time = file.uncompress_time;
                entry.uncompress_size = file.uncompress_size;
            }

            if file.data.is_empty() {
                self.aggregator.record_failure(
                    index,
                    &unit.name,
                    format!("FAIL! File [{}]: {}; file size is zero", no, unit.name),
                );
                continue;
            }

            let data_len = file.data.len();
            let task_options = options.clone();
            let task_hooks = hooks;
            let (outcome, returned_hooks) =
                tokio::task::spawn_blocking(move || run_file(file, task_options, task_hooks))
                    .await?;
            hooks = returned_hooks;

            match outcome {
                FileOutcome::Converted {
                    conversion,
                    messages,
                } => {
                    for message in messages {
                        self.aggregator.log(message);
                    }
                    let ok_line = if conversion.stderr.is_empty() {
                        format!(
                            "File [{}]: {} OK; topoJSON length: {}; runtime: {} S",
                            no, unit.name, conversion.output_size, conversion.runtime
                        )
                    } else {
                        format!(
                            "File [{}]: {} OK; topoJSON length: {}; runtime: {} S:\ntopology() stderr >>>\n{}<<< topology() stderr",
                            no, unit.name, conversion.output_size, conversion.runtime, conversion.stderr
                        )
                    };
                    tracing::info!(
                        file = %unit.name,
                        output_size = conversion.output_size,
                        runtime_s = conversion.runtime,
                        "converted"
                    );
                    let entry = self.aggregator.entry_mut(index, &unit.name);
                    entry.topojson_runtime = Some(conversion.runtime);
                    entry.topojson_stderr = conversion.stderr;
                    entry.topojson = Some(conversion.topology);
                    self.aggregator.log(ok_line);
                }
                FileOutcome::Failed {
                    message,
                    stderr,
                    messages,
                } => {
                    for m in messages {
                        self.aggregator.log(m);
                    }
                    tracing::warn!(file = %unit.name, "conversion failed");
                    let mut text = format!(
                        "FAIL! Your input file {}: {}; size: {}; {}",
                        no, unit.name, data_len, message
                    );
                    if !stderr.is_empty() {
                        text.push_str(&format!("\nstderr >>>\n{}<<< end of stderr", stderr));
                    }
                    self.aggregator.entry_mut(index, &unit.name).topojson_stderr = stderr;
                    self.aggregator.record_failure(index, &unit.name, text);
                }
            }
        }

        for message in hooks.take_messages() {
            self.aggregator.log(message);
        }
        let field_errors = self.state.field_errors + hooks.field_errors();
        Ok(self.aggregator.finalize(field_errors, self.state.echo))
    }
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

enum FileOutcome {
    Converted {
        conversion: FileConversion,
        messages: Vec<String>,
    },
    Failed {
        message: String,
        stderr: String,
        messages: Vec<String>,
    },
}

/// Parse and convert one file. Runs on the blocking pool.
fn run_file(
    file: AssembledFile,
    options: TopologyOptions,
    mut hooks: PropertyHooks,
) -> (FileOutcome, PropertyHooks) {
    let report = match parse_collection(&file.data) {
        Ok(report) => report,
        Err(err) => {
            let message = format!(
                "does not seem to contain valid GeoJSON: {}\nData:\n{}",
                err,
                input_preview(&file.data)
            );
            return (
                FileOutcome::Failed {
                    message,
                    stderr: String::new(),
                    messages: Vec::new(),
                },
                hooks,
            );
        }
    };

    let messages = report.messages;
    match convert(&report.collection, &options, &mut hooks, &file.data) {
        Ok(conversion) => (
            FileOutcome::Converted {
                conversion,
                messages,
            },
            hooks,
        ),
        Err(geo2topo_topology::Error::TopologyConversionFailed {
            message,
            preview,
            stderr,
        }) => (
            FileOutcome::Failed {
                message: format!(
                    "does not seem to contain valid TopoJSON: {}\nData:\n{}",
                    message, preview
                ),
                stderr,
                messages,
            },
            hooks,
        ),
        Err(err) => (
            FileOutcome::Failed {
                message: err.to_string(),
                stderr: String::new(),
                messages,
            },
            hooks,
        ),
    }
}

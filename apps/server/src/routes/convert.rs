// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion endpoint: multipart GeoJSON upload to TopoJSON.

use crate::error::ApiError;
use crate::services::{ConvertResponse, UploadSession};
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use geo2topo_core::{ChunkAssembler, Encoding};

/// POST /api/v1/convert - Convert uploaded GeoJSON files to TopoJSON.
///
/// File parts stream through the chunk assembler as they arrive; form
/// fields are interpreted immediately. Processing starts once the whole
/// form is drained, so fields apply regardless of part order, as with
/// ordinary multipart form senders.
pub async fn convert(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ConvertResponse>), ApiError> {
    let content_encoding = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let mut session = UploadSession::new();
    let mut no_files = 0usize;
    let mut no_fields = 0usize;
    let mut no_parts = 0usize;

    while let Some(mut field) = multipart.next_field().await? {
        no_parts += 1;
        if no_parts > state.config.max_parts {
            return Err(ApiError::PartsLimitReached {
                max: state.config.max_parts,
            });
        }

        if let Some(filename) = field.file_name().map(str::to_owned) {
            no_files += 1;
            if no_files > state.config.max_files {
                return Err(ApiError::FilesLimitReached {
                    max: state.config.max_files,
                });
            }
            tracing::debug!(file = %filename, "receiving file part");

            let mut assembler = ChunkAssembler::new();
            while let Some(chunk) = field.chunk().await? {
                assembler.push(&chunk);
            }
            tracing::debug!(file = %filename, size = assembler.len(), "file part received");

            let assembled = Encoding::from_parts(content_encoding.as_deref(), &filename)
                .and_then(|encoding| assembler.finish(encoding));
            session.accept_file(&filename, assembled);
        } else {
            no_fields += 1;
            if no_fields > state.config.max_fields {
                return Err(ApiError::FieldsLimitReached {
                    max: state.config.max_fields,
                });
            }
            let name = field.name().unwrap_or_default().to_string();
            let value = field.text().await?;
            session.accept_field(&name, &value);
        }
    }

    let (status, response) = session.process().await?;
    tracing::info!(
        status = %status,
        no_files = response.no_files,
        field_errors = response.field_errors,
        file_errors = response.file_errors,
        "conversion request complete"
    );
    Ok((status, Json(response)))
}

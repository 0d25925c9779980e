// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary-safe chunk assembly and decompression for streamed uploads.
//!
//! Chunks are accumulated as raw bytes (no string round-trip, so non-UTF8
//! input survives intact) and concatenated once the stream ends. Gzip and
//! zlib payloads are inflated with [flate2](https://docs.rs/flate2).

use crate::error::{Error, Result};
use flate2::read::{GzDecoder, ZlibDecoder};
use std::io::Read;
use std::time::Instant;

/// Content encoding of an uploaded file part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Raw bytes, no decompression.
    None,
    /// RFC 1952 gzip stream.
    Gzip,
    /// RFC 1950 zlib-wrapped deflate stream.
    Zlib,
}

impl Encoding {
    /// Infer the encoding of a file part from the request `Content-Encoding`
    /// header and the file name extension.
    ///
    /// The header wins when present; `zip` archives are refused. Without a
    /// header, `.gz` implies gzip and `.lz77` implies zlib.
    pub fn from_parts(content_encoding: Option<&str>, filename: &str) -> Result<Encoding> {
        if let Some(header) = content_encoding {
            return match header {
                "gzip" => Ok(Encoding::Gzip),
                "zlib" | "deflate" => Ok(Encoding::Zlib),
                "zip" => Err(Error::UnsupportedEncoding("zip".to_string())),
                _ => Ok(Encoding::None),
            };
        }
        match filename.rsplit('.').next() {
            Some("gz") => Ok(Encoding::Gzip),
            Some("lz77") => Ok(Encoding::Zlib),
            _ => Ok(Encoding::None),
        }
    }
}

/// An assembled (and, where needed, decompressed) upload with its metrics.
#[derive(Debug, Clone)]
pub struct AssembledFile {
    /// Decompressed file contents.
    pub data: Vec<u8>,
    /// Transferred (compressed) size in bytes.
    pub file_size: usize,
    /// Wall-clock seconds from first to last received byte.
    pub transfer_time: f64,
    /// Seconds spent inflating, when the file was compressed.
    pub uncompress_time: Option<f64>,
    /// Decompressed size in bytes, when the file was compressed.
    pub uncompress_size: Option<usize>,
}

/// Accumulates the binary chunks of one streamed file part.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    chunks: Vec<Vec<u8>>,
    total: usize,
    first_byte: Option<Instant>,
    last_byte: Option<Instant>,
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk, preserving exact byte order and length.
    pub fn push(&mut self, chunk: &[u8]) {
        let now = Instant::now();
        if self.first_byte.is_none() {
            self.first_byte = Some(now);
        }
        self.last_byte = Some(now);
        self.total += chunk.len();
        self.chunks.push(chunk.to_vec());
    }

    /// Total bytes received so far.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Concatenate all chunks and decompress per `encoding`.
    ///
    /// A decompression failure reports `DecompressionFailed` and fails only
    /// this file, not the surrounding request.
    pub fn finish(self, encoding: Encoding) -> Result<AssembledFile> {
        let transfer_time = match (self.first_byte, self.last_byte) {
            (Some(first), Some(last)) => last.duration_since(first).as_secs_f64(),
            _ => 0.0,
        };

        let mut buf = Vec::with_capacity(self.total);
        for chunk in &self.chunks {
            buf.extend_from_slice(chunk);
        }
        let file_size = buf.len();

        match encoding {
            Encoding::None => Ok(AssembledFile {
                data: buf,
                file_size,
                transfer_time,
                uncompress_time: None,
                uncompress_size: None,
            }),
            Encoding::Gzip => {
                let start = Instant::now();
                let mut data = Vec::new();
                GzDecoder::new(buf.as_slice())
                    .read_to_end(&mut data)
                    .map_err(|e| Error::DecompressionFailed {
                        detail: format!("gunzip: {}", e),
                    })?;
                Ok(AssembledFile {
                    uncompress_time: Some(start.elapsed().as_secs_f64()),
                    uncompress_size: Some(data.len()),
                    data,
                    file_size,
                    transfer_time,
                })
            }
            Encoding::Zlib => {
                let start = Instant::now();
                let mut data = Vec::new();
                ZlibDecoder::new(buf.as_slice())
                    .read_to_end(&mut data)
                    .map_err(|e| Error::DecompressionFailed {
                        detail: format!("inflate: {}", e),
                    })?;
                Ok(AssembledFile {
                    uncompress_time: Some(start.elapsed().as_secs_f64()),
                    uncompress_size: Some(data.len()),
                    data,
                    file_size,
                    transfer_time,
                })
            }
        }
    }
}

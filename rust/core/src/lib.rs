// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Geo2Topo Core
//!
//! Ingestion pipeline for uploaded GeoJSON files: binary-safe chunk
//! assembly, gzip/zlib decompression, and large-buffer feature collection
//! parsing built on [memchr](https://docs.rs/memchr) byte scanning.
//!
//! ## Overview
//!
//! - **Chunk assembly**: streamed upload chunks are concatenated without
//!   any string round-trip, then inflated when the part was compressed
//! - **Feature scanning**: feature boundaries are located by literal
//!   search plus balanced-brace scanning, so collections far larger than
//!   any single string conversion can parse feature by feature
//! - **Metrics**: transfer, uncompress and parse timings are captured for
//!   the per-file diagnostics of the conversion service
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use geo2topo_core::{parse_collection, ChunkAssembler, Encoding};
//!
//! let mut assembler = ChunkAssembler::new();
//! assembler.push(chunk);
//! let file = assembler.finish(Encoding::Gzip)?;
//!
//! let report = parse_collection(&file.data)?;
//! println!("{} features", report.collection.features.len());
//! ```

pub mod assemble;
pub mod error;
pub mod geojson;
pub mod scan;

pub use assemble::{AssembledFile, ChunkAssembler, Encoding};
pub use error::{Error, Result};
pub use geojson::{Feature, FeatureCollection, Geometry, Position};
pub use scan::{
    parse_collection, parse_collection_with_limit, FeatureScanner, ParseReport,
    COLLECTION_PREFIX, FEATURE_START, MAX_WHOLE_PARSE_BYTES,
};

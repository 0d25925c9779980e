// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service modules for the conversion pipeline.

pub mod fields;
pub mod response;
pub mod session;

pub use fields::{process_field, FieldState};
pub use response::{ConvertResponse, FileEntry, ResponseAggregator};
pub use session::UploadSession;

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for wall extraction
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting walls
///
/// Only malformed input is an error. A well-formed drawing with no
/// detectable walls is reported as an empty wall list.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True when the image buffer itself could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }
}

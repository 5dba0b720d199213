//! Errors raised while loading fonts.
//!
//! Only the loading paths return these. Per-frame queries degrade to
//! zero-valued results instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Font data is empty")]
    EmptyData,
    #[error("Failed to parse font: {0}")]
    Parse(String),
    #[error("Font has no Unicode character map")]
    NoUnicodeCmap,
    #[error("Font limit reached ({0} fonts)")]
    TooManyFonts(usize),
}

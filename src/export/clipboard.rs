//! Clipboard delivery with a fallback path.
//!
//! The platform write is provided by the host. When the primary write
//! fails, the same text goes through the fallback (in a browser, the
//! hidden-textarea copy command).

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard write rejected: {0}")]
    Rejected(String),
    #[error("clipboard unavailable")]
    Unavailable,
    #[error("primary write failed ({primary}) and fallback failed ({fallback})")]
    Exhausted {
        primary: Box<ClipboardError>,
        fallback: Box<ClipboardError>,
    },
}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Which path delivered the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    Primary,
    Fallback,
}

pub fn copy_with_fallback(
    primary: &mut dyn Clipboard,
    fallback: &mut dyn Clipboard,
    text: &str,
) -> Result<CopyPath, ClipboardError> {
    let primary_err = match primary.write_text(text) {
        Ok(()) => return Ok(CopyPath::Primary),
        Err(err) => err,
    };
    warn!(error = %primary_err, "clipboard write failed, using fallback");
    match fallback.write_text(text) {
        Ok(()) => Ok(CopyPath::Fallback),
        Err(fallback_err) => Err(ClipboardError::Exhausted {
            primary: Box::new(primary_err),
            fallback: Box::new(fallback_err),
        }),
    }
}

/// Clipboard that never works, for hosts without a fallback mechanism.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

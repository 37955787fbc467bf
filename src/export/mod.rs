pub mod clipboard;

use crate::annotator::interceptor::CapturedError;
use crate::annotator::types::Annotation;
use crate::dom::Viewport;

/// Placeholder body when there is nothing to report.
pub const EMPTY_BODY: &str = "(none)";

/// Render the feedback report handed to the clipboard.
///
/// Annotations are written in the order given, which is index order when
/// they come from the store. Inputs are not modified.
pub fn format(
    annotations: &[Annotation],
    errors: &[CapturedError],
    include_errors: bool,
    page_url: &str,
    viewport: Viewport,
) -> String {
    let mut out = format!(
        "## Page Feedback: {page_url}\n**Viewport:** {}×{}\n\n",
        viewport.width, viewport.height
    );

    if include_errors && !errors.is_empty() {
        out.push_str(&format!("### 🚫 Console Errors ({})\n\n", errors.len()));
        for (i, error) in errors.iter().enumerate() {
            out.push_str(&format!("#### Error {}\n", i + 1));
            out.push_str(&format!("```\n{}\n```\n", error.message));
            if !error.source.is_empty() {
                out.push_str(&format!(
                    "**Source:** {}:{}:{}\n",
                    error.source, error.lineno, error.colno
                ));
            }
            out.push('\n');
        }
        out.push_str("---\n\n");
    }

    if annotations.is_empty() {
        out.push_str(EMPTY_BODY);
        out.push('\n');
        return out;
    }

    for annotation in annotations {
        out.push_str(&format!(
            "### {}. {}\n",
            annotation.index,
            annotation.identifier()
        ));
        out.push_str(&format!("**Location:** {}\n", annotation.selector()));
        out.push_str(&format!("**Comment:** {}\n\n", annotation.comment));
    }

    out
}

//! Bounded-size context assembly.

use tracing::debug;

use ragkit_core::ScoredDocument;

/// Formats retrieved documents into a bounded-size context block.
///
/// Documents are taken in result order and joined by a fixed delimiter. A
/// document is only appended when its full content still fits within the
/// length budget; documents that do not fit are dropped whole — content is
/// never split — and later, shorter documents may still be appended.
///
/// Lengths are measured in characters.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    delimiter: String,
}

impl ContextAssembler {
    /// Create an assembler with the default `"\n\n"` delimiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler with a custom delimiter.
    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        Self { delimiter: delimiter.into() }
    }

    /// Concatenate document contents into a context block of at most
    /// `max_length` characters.
    ///
    /// Returns an empty string when no document fits. Whenever `max_length`
    /// is at least the length of the shortest document's content, at least
    /// one document is included.
    pub fn assemble(&self, documents: &[ScoredDocument], max_length: usize) -> String {
        let delimiter_length = self.delimiter.chars().count();
        let mut context = String::new();
        let mut length = 0usize;
        let mut included = 0usize;
        let mut dropped = 0usize;

        for scored in documents {
            let content = &scored.document.content;
            let content_length = content.chars().count();
            let separator_length = if included == 0 { 0 } else { delimiter_length };
            if length + separator_length + content_length > max_length {
                dropped += 1;
                continue;
            }
            if included > 0 {
                context.push_str(&self.delimiter);
            }
            context.push_str(content);
            length += separator_length + content_length;
            included += 1;
        }

        if dropped > 0 {
            debug!(included, dropped, max_length, "context budget dropped whole documents");
        }
        context
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self { delimiter: "\n\n".to_string() }
    }
}

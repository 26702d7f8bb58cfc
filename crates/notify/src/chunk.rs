use crate::sanitize::{FormattingMode, sanitize};

/// Telegram message size limit, in Unicode code points.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Code points reserved in non-final segments for the continuation marker.
const RESERVED: usize = CONTINUATION_MARKER.len();

/// Appended to every non-final segment to signal truncation to the reader.
pub const CONTINUATION_MARKER: &str = "...";

/// One bounded-length piece of a logical message, sent as one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSegment {
    pub index: usize,
    pub text: String,
    pub is_final: bool,
}

impl MessageSegment {
    /// Content length in Unicode code points (the unit the transport limits).
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Sanitize `text` for `mode` and split it into ordered segments, each at
/// most [`MAX_MESSAGE_LEN`] code points.
///
/// Text that fits the limit becomes a single unmarked segment. Longer text is
/// cut positionally into slices of `MAX_MESSAGE_LEN - 3` code points, each
/// followed by the `...` marker; the remainder becomes the final unmarked
/// segment. Splitting makes no attempt to avoid breaking mid-word or mid-tag.
///
/// Empty input yields a single empty segment so the dispatcher still performs
/// exactly one send.
#[must_use]
pub fn chunk(text: &str, mode: FormattingMode) -> Vec<MessageSegment> {
    let sanitized = sanitize(text, mode);
    let mut segments = Vec::new();
    let mut rest = sanitized.as_str();

    while rest.chars().count() > MAX_MESSAGE_LEN {
        let cut = byte_offset_of_char(rest, MAX_MESSAGE_LEN - RESERVED);
        let (head, tail) = rest.split_at(cut);
        segments.push(MessageSegment {
            index: segments.len(),
            text: format!("{head}{CONTINUATION_MARKER}"),
            is_final: false,
        });
        rest = tail;
    }

    segments.push(MessageSegment {
        index: segments.len(),
        text: rest.to_owned(),
        is_final: true,
    });
    segments
}

/// Byte offset of the `n`-th code point of `s` (or `s.len()` past the end).
fn byte_offset_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

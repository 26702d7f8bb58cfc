use serde::{Deserialize, Serialize};

/// Formatting mode for outbound messages. Selects which markup survives
/// sanitization and which `parse_mode` the transport receives.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormattingMode {
    /// No markup; every tag is stripped.
    #[default]
    Plain,
    /// Telegram HTML; the inline allow-list below survives.
    Html,
}

impl FormattingMode {
    /// Transport-level `parse_mode` value. Empty for plain text.
    #[must_use]
    pub fn parse_mode(self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Html => "HTML",
        }
    }
}

/// Inline tags Telegram accepts in HTML parse mode. Matching is
/// case-sensitive, as the Bot API expects lowercase tag names.
const ALLOWED_HTML_TAGS: &[&str] = &[
    "b",
    "strong",
    "i",
    "em",
    "a",
    "u",
    "ins",
    "code",
    "pre",
    "blockquote",
    "tg-spoiler",
    "tg-emoji",
];

/// Strip markup from `text` according to `mode`.
///
/// Plain mode removes every tag; HTML mode keeps allow-listed tags verbatim
/// (attributes included) and removes the rest. Tag contents are never
/// altered. Total over any input.
#[must_use]
pub fn sanitize(text: &str, mode: FormattingMode) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(lt) = rest.find('<') {
        let (before, candidate) = rest.split_at(lt);
        out.push_str(before);

        // Only `<` followed by a name start, `/`, or `!` opens a tag; a bare
        // `<` in prose (e.g. "2 < 3") stays literal.
        let after_lt = &candidate[1..];
        if !after_lt.starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!') {
            out.push('<');
            rest = after_lt;
            continue;
        }

        // Comments run through `-->`, even across `>` (strip_tags parity);
        // an unterminated comment discards the rest of the input.
        if after_lt.starts_with("!--") {
            let Some(end) = candidate.find("-->") else {
                return out;
            };
            rest = &candidate[end + 3..];
            continue;
        }

        // An unterminated tag discards the rest of the input.
        let Some(gt) = candidate.find('>') else {
            return out;
        };
        let tag = &candidate[..=gt];
        if mode == FormattingMode::Html && is_allowed_tag(tag) {
            out.push_str(tag);
        }
        rest = &candidate[gt + 1..];
    }

    out.push_str(rest);
    out
}

/// Whether `tag` (including the `<`/`>` delimiters) is on the allow-list.
fn is_allowed_tag(tag: &str) -> bool {
    let inner = tag.trim_start_matches('<').trim_end_matches('>');
    let inner = inner.strip_prefix('/').unwrap_or(inner);
    let name_end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    ALLOWED_HTML_TAGS.contains(&&inner[..name_end])
}

//! Removal of reviewer annotations from a reviewed answer.
//!
//! A reviewed answer may carry two kinds of header lines:
//!
//! * a replacement marker (`수정된 답변:`): what follows supersedes
//!   everything written before it;
//! * a critique marker (`개선 사항:`): that line and everything after it is
//!   reviewer metadata.
//!
//! The scan is a single pass over lines with two states, `Copy` and
//! `Discard`. The only transition is `Copy -> Discard`.

use nq_inference::{CRITIQUE_MARKERS, REPLACEMENT_MARKERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    Replacement,
    Critique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Copy,
    Discard,
}

/// A marker is a phrase followed by a colon, closed by `**`, or alone on its
/// line. Returns the kind and whatever follows the marker on the same line.
fn match_marker(line: &str) -> Option<(Marker, &str)> {
    let stripped = line
        .trim()
        .trim_start_matches(|c: char| matches!(c, '#' | '*' | '>' | '-') || c.is_whitespace());

    let candidates = REPLACEMENT_MARKERS
        .iter()
        .map(|m| (Marker::Replacement, *m))
        .chain(CRITIQUE_MARKERS.iter().map(|m| (Marker::Critique, *m)));

    for (kind, phrase) in candidates {
        let Some(head) = stripped.get(..phrase.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(phrase) {
            continue;
        }
        let rest = &stripped[phrase.len()..];
        let (closed, rest) = match rest.strip_prefix("**") {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix(':').or_else(|| rest.strip_prefix('：')) {
            return Some((kind, after.trim_start_matches("**").trim()));
        }
        // Without a colon the phrase must be a heading of its own.
        if rest.is_empty() || closed {
            return Some((kind, rest));
        }
    }
    None
}

#[cfg(test)]
fn find_marker(line: &str) -> Option<Marker> {
    match_marker(line).map(|(kind, _)| kind)
}

/// Strip reviewer annotations from `text`. Pure; text without markers is
/// returned unchanged.
pub fn strip_critique(text: &str) -> String {
    let mut state = ScanState::Copy;
    let mut kept: Vec<&str> = Vec::new();
    let mut saw_marker = false;

    for line in text.split('\n') {
        match state {
            ScanState::Discard => break,
            ScanState::Copy => match match_marker(line) {
                Some((Marker::Critique, _)) => {
                    saw_marker = true;
                    state = ScanState::Discard;
                }
                Some((Marker::Replacement, rest)) => {
                    saw_marker = true;
                    kept.clear();
                    if !rest.is_empty() {
                        kept.push(rest);
                    }
                }
                None => kept.push(line),
            },
        }
    }

    if !saw_marker {
        return text.to_string();
    }
    kept.join("\n")
}

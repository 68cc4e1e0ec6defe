//! Splitting long answers into fragments the platform will accept.
//!
//! Lengths are counted in characters. Each cut is made at the best boundary
//! inside the allowed window: a paragraph break, then a line break, then the
//! end of a sentence, then any whitespace, and only as a last resort in the
//! middle of a word. Whitespace at the cut is dropped.
//!
//! Code fences survive a cut: a fragment that ends inside a ``` block is
//! closed, and the next fragment reopens it with the same info string.

const FENCE: &str = "```";
const CLOSE_FENCE: &str = "\n```";
/// Smallest limit that leaves room for a reopened and closed fence.
const MIN_FENCED_LIMIT: usize = 9;

/// Split `text` into fragments of at most `limit` characters.
///
/// Text shorter than `limit` comes back unchanged as a single fragment,
/// unless it is blank: blank text yields no fragments at all, since the
/// platform refuses to deliver an empty message. No fragment is ever blank.
pub fn split_response(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.trim().is_empty() {
        return Vec::new();
    }
    if char_len(text) < limit {
        return vec![text.to_string()];
    }

    let track_fences = limit >= MIN_FENCED_LIMIT;
    let mut fragments = Vec::new();
    let mut rest = text;
    let mut open_fence: Option<String> = None;

    loop {
        rest = skip_blank_lines(rest);
        if rest.trim().is_empty() {
            break;
        }

        let prefix = match &open_fence {
            Some(info) => reopen(info, limit),
            None => String::new(),
        };
        let room = limit - char_len(&prefix);

        if char_len(rest) <= room {
            fragments.push(format!("{prefix}{rest}"));
            break;
        }

        let mut step = cut_within(rest, room, track_fences);
        if let Some((piece, _)) = step
            && track_fences
            && fence_after(&prefix, piece).is_some()
        {
            step = cut_within(rest, room - CLOSE_FENCE.len(), track_fences);
        }

        let Some((piece, next)) = step else {
            // A fence line that cannot share a fragment with anything: carry
            // it as fence state so the next fragment opens (or skips) it.
            let (line, next) = rest.split_once('\n').unwrap_or((rest, ""));
            open_fence = fence_after(&prefix, line);
            rest = next;
            continue;
        };

        let still_open = if track_fences { fence_after(&prefix, piece) } else { None };
        let mut fragment = format!("{prefix}{piece}");
        if still_open.is_some() {
            fragment.push_str(CLOSE_FENCE);
        }
        fragments.push(fragment);
        open_fence = still_open;
        rest = next;
    }

    fragments
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the `chars`-th character, or the end of `text`.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

/// Drop whole blank lines at the front, keeping the indentation of the first
/// line with content.
fn skip_blank_lines(text: &str) -> &str {
    let content_start = text.len() - text.trim_start().len();
    match text[..content_start].rfind('\n') {
        Some(i) => &text[i + 1..],
        None => text,
    }
}

fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with(FENCE)
}

/// The opening line for a fence carried over from the previous fragment.
/// Falls back to a bare fence when the info string would not leave room.
fn reopen(info: &str, limit: usize) -> String {
    let full = format!("{FENCE}{info}\n");
    if char_len(&full) + CLOSE_FENCE.len() < limit {
        full
    } else {
        format!("{FENCE}\n")
    }
}

/// The info string of the fence left open at the end of `prefix` + `piece`.
fn fence_after(prefix: &str, piece: &str) -> Option<String> {
    let mut open: Option<String> = None;
    for line in prefix.lines().chain(piece.lines()) {
        if let Some(after) = line.trim_start().strip_prefix(FENCE) {
            open = match open {
                Some(_) => None,
                None => Some(after.trim().to_string()),
            };
        }
    }
    open
}

/// Cut a non-blank piece of at most `room` characters off the front of
/// `rest`. With `keep_fences`, a cut never lands inside a fence line; when
/// the first line is a fence line that does not fit, there is nothing to
/// cut and `None` is returned.
fn cut_within(rest: &str, room: usize, keep_fences: bool) -> Option<(&str, &str)> {
    let rest = if rest[..byte_offset(rest, room)].trim().is_empty() {
        rest.trim_start()
    } else {
        rest
    };
    if char_len(rest) <= room {
        return Some((rest, ""));
    }

    let (piece, next) = cut(rest, room);
    if !keep_fences {
        return Some((piece, next));
    }

    let at = piece.len();
    let line_start = rest[..at].rfind('\n').map_or(0, |i| i + 1);
    let line_end = rest[at..].find('\n').map_or(rest.len(), |i| at + i);
    let severed = !rest[at..line_end].trim().is_empty();
    if !(severed && is_fence_line(&rest[line_start..line_end])) {
        return Some((piece, next));
    }

    let before = rest[..line_start].trim_end();
    if before.trim().is_empty() {
        None
    } else {
        Some((before, &rest[line_start..]))
    }
}

/// Split `rest` within its first `room` characters. Returns the fragment
/// body (never blank) and the remaining text. The window must hold content.
fn cut(rest: &str, room: usize) -> (&str, &str) {
    let end = byte_offset(rest, room);
    let window = &rest[..end];
    let usable = |i: usize| !window[..i].trim().is_empty();

    if let Some(i) = window.rfind("\n\n").filter(|&i| usable(i)) {
        return (window[..i].trim_end(), rest[i..].trim_start_matches(['\n', '\r']));
    }
    if let Some(i) = window.rfind('\n').filter(|&i| usable(i)) {
        return (window[..i].trim_end(), rest[i + 1..].trim_start_matches(['\n', '\r']));
    }
    let sentence_end = [". ", "! ", "? "]
        .iter()
        .filter_map(|p| window.rfind(p))
        .max()
        .filter(|&i| usable(i + 1));
    if let Some(i) = sentence_end {
        return (&window[..i + 1], &rest[i + 2..]);
    }
    let space = window
        .char_indices()
        .rev()
        .find(|&(i, c)| c.is_whitespace() && usable(i));
    if let Some((i, c)) = space {
        return (window[..i].trim_end(), &rest[i + c.len_utf8()..]);
    }
    (window, &rest[end..])
}

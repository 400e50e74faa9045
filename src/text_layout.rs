use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputViewport {
    pub visible: String,
    pub cursor_col: u16,
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Horizontal window over a single-line input that keeps the cursor on screen.
/// `cursor` is a char index; widths are terminal columns, and the cursor cell
/// (one column at the end of the text) always fits.
pub fn input_viewport(text: &str, cursor: usize, width: u16) -> InputViewport {
    let width = usize::from(width.max(1));
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    let cursor_cell = chars.get(cursor).map_or(1, |c| char_width(*c).max(1));

    let mut start = 0;
    let mut before: usize = chars[..cursor].iter().map(|c| char_width(*c)).sum();
    while start < cursor && before + cursor_cell > width {
        before -= char_width(chars[start]);
        start += 1;
    }

    let mut used = 0;
    let visible: String = chars[start..]
        .iter()
        .take_while(|c| {
            let w = char_width(**c);
            if used + w > width {
                return false;
            }
            used += w;
            true
        })
        .collect();
    InputViewport {
        visible,
        cursor_col: before.min(width.saturating_sub(1)) as u16,
    }
}

/// Shortens `text` to at most `max_width` terminal columns, ending in `…`.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = char_width(c);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

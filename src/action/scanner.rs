//! Tolerant field scanner for JSON-like model output
//!
//! Model replies are usually JSON, but often wrapped in prose or markdown
//! fences, and sometimes slightly malformed. Instead of a strict parse, the
//! scanner walks the text once with quote and escape awareness and pulls out
//! individual fields. Persisted files fall back to the same scanner when they
//! are not strict JSON.
//!
//! Every structural character the scanner cares about is ASCII, so byte
//! offsets found here are always valid `str` boundaries.

/// Index one past the closing quote of the string literal opening at `open`.
/// A quote preceded by a backslash does not close the string.
fn string_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Index of the bracket closing the `{` or `[` at `open`
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = string_end(bytes, i)?;
                continue;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Offset where the value of `key` starts.
///
/// Only quoted tokens followed by `:` count as keys, so a key name that
/// appears inside some string value is never matched. When the key occurs at
/// several nesting levels the shallowest occurrence wins.
fn find_value(text: &str, key: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut best: Option<(usize, usize)> = None;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let Some(end) = string_end(bytes, i) else {
                    break;
                };
                let after = skip_ws(bytes, end);
                if bytes.get(after) == Some(&b':') && &text[i + 1..end - 1] == key {
                    let value = skip_ws(bytes, after + 1);
                    if best.map_or(true, |(d, _)| depth < d) {
                        best = Some((depth, value));
                    }
                }
                i = end;
                continue;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }

    best.map(|(_, value)| value)
}

/// Scalar value starting at `start`: a quoted string (unescaped) or a bare
/// token such as a number. `null`, objects and arrays yield `None`.
fn scalar_at(text: &str, start: usize) -> Option<String> {
    let bytes = text.as_bytes();
    match *bytes.get(start)? {
        b'"' => {
            let end = string_end(bytes, start)?;
            Some(unescape(&text[start + 1..end - 1]))
        }
        b'{' | b'[' => None,
        _ => {
            let len = text[start..]
                .find([',', '}', ']', '\n', '\r'])
                .unwrap_or(text.len() - start);
            let token = text[start..start + len].trim();
            if token.is_empty() || token == "null" {
                None
            } else {
                Some(token.to_string())
            }
        }
    }
}

/// Decode JSON string escapes. Unknown or broken escapes are kept as written.
pub fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Every balanced top-level `{…}` in `text`, in order. An opening brace
/// that never closes is skipped.
pub fn objects(text: &str) -> impl Iterator<Item = &str> + '_ {
    let bytes = text.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        while let Some(offset) = text.get(pos..)?.find('{') {
            let start = pos + offset;
            match matching_close(bytes, start) {
                Some(close) => {
                    pos = close + 1;
                    return text.get(start..=close);
                }
                None => pos = start + 1,
            }
        }
        None
    })
}

/// Contents (without brackets) of the first balanced `[…]` in `text`
pub fn find_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let close = matching_close(text.as_bytes(), start)?;
    text.get(start + 1..close)
}

/// Scalar value of `key`, unescaped
pub fn string_field(text: &str, key: &str) -> Option<String> {
    let start = find_value(text, key)?;
    scalar_at(text, start)
}

/// Like [`string_field`] but treats a blank value as absent
pub fn non_empty_field(text: &str, key: &str) -> Option<String> {
    string_field(text, key).filter(|value| !value.trim().is_empty())
}

/// Contents (without brackets) of the array value of `key`
pub fn array_field<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let start = find_value(text, key)?;
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'[') {
        return None;
    }
    let close = matching_close(bytes, start)?;
    text.get(start + 1..close)
}

/// Split array contents into element substrings at top-level commas.
/// Commas inside strings, objects or nested arrays do not split.
pub fn split_elements(array: &str) -> Vec<&str> {
    let bytes = array.as_bytes();
    let mut elements = Vec::new();
    let mut depth = 0usize;
    let mut segment_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = string_end(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                elements.push(&array[segment_start..i]);
                segment_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    elements.push(&array[segment_start..]);

    elements
        .into_iter()
        .map(str::trim)
        .filter(|element| !element.is_empty())
        .collect()
}

/// Array contents as a list of scalars, e.g. `"a", "b", 3` → `["a", "b", "3"]`
pub fn string_elements(array: &str) -> Vec<String> {
    split_elements(array)
        .into_iter()
        .filter_map(|element| scalar_at(element, 0))
        .filter(|value| !value.trim().is_empty())
        .collect()
}

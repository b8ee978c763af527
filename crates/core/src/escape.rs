//! Delimiter splitting with backslash escapes
//!
//! Pattern lists arrive as a single line of text such as `*.txt;*.ini`.
//! A backslash directly before the delimiter keeps it literal.

/// Split `input` on `delimiter`, honouring `\<delimiter>` escapes
///
/// - `\` followed by the delimiter yields the delimiter itself
/// - `\` followed by anything else is kept as-is
/// - Empty segments are dropped
pub fn split_escapable(input: &str, delimiter: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut buffer = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&delimiter) {
            buffer.push(delimiter);
            chars.next();
            continue;
        }

        if c == delimiter {
            if !buffer.is_empty() {
                parts.push(std::mem::take(&mut buffer));
            }
        } else {
            buffer.push(c);
        }
    }

    if !buffer.is_empty() {
        parts.push(buffer);
    }

    parts
}

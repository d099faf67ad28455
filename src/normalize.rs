// src/normalize.rs

/// Separator used when rejoining multi-value cells.
pub const FIELD_SEPARATOR: char = ';';

/// Split `text` on `\n`, dropping a single trailing empty segment produced
/// by a trailing line terminator, never more. `\r\n` endings are accepted.
pub fn split_lines(text: &str) -> Vec<String> {
    let body = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Trim every entry and drop the trailing entries that end up empty.
pub fn remove_junk<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let mut out: Vec<String> = items.iter().map(|s| s.as_ref().trim().to_string()).collect();
    while out.last().is_some_and(|s| s.is_empty()) {
        out.pop();
    }
    out
}

/// Split `raw` on `delimiter`, clean the pieces with [`remove_junk`] and
/// rejoin them with `;`.
///
/// `" happy ; sad ;"` becomes `"happy;sad"`.
pub fn clean_up_string(raw: &str, delimiter: char) -> String {
    let parts: Vec<&str> = raw.split(delimiter).collect();
    remove_junk(&parts).join(&FIELD_SEPARATOR.to_string())
}

/// [`clean_up_string`] over every entry, then drop trailing empty entries.
pub fn clean_up_string_list<S: AsRef<str>>(items: &[S], delimiter: char) -> Vec<String> {
    let mut out: Vec<String> = items
        .iter()
        .map(|s| clean_up_string(s.as_ref(), delimiter))
        .collect();
    while out.last().is_some_and(|s| s.is_empty()) {
        out.pop();
    }
    out
}

pub fn lowercase_list<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|s| s.as_ref().to_lowercase()).collect()
}

/// Split a cleaned multi-value cell into its fields.
pub fn split_fields(cell: &str) -> Vec<String> {
    cell.split(FIELD_SEPARATOR).map(str::to_string).collect()
}

/// Characters from `illegal` that occur in `value`, in first-seen order.
pub fn find_illegal(value: &str, illegal: &[char]) -> Vec<char> {
    let mut found = Vec::new();
    for c in value.chars() {
        if illegal.contains(&c) && !found.contains(&c) {
            found.push(c);
        }
    }
    found
}

//! Book identifier normalization
//!
//! Identifiers arrive in whatever shape the client typed (`978-605-080-000-1`,
//! `978 605 0800001`, ...). Everything downstream (URL templates, the trust
//! gate, the provider prompt) works on the cleaned form.

/// Strip every character that is not an ASCII digit or `X`/`x`
///
/// Falls back to the raw input when nothing survives, so a search key is
/// never empty.
pub fn clean(raw: &str) -> String {
    let cleaned = strip(raw);
    if cleaned.is_empty() {
        raw.to_string()
    } else {
        cleaned
    }
}

/// Strip non-identifier characters without the empty-result fallback
///
/// Used where an empty result must stay empty (e.g. a provider claiming
/// `"sourceIsbn": "n/a"`).
pub fn strip(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
        .collect()
}

/// Case-insensitive comparison on the `X` check character
pub fn same_identifier(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Derive the 10-character form of a `978`-prefixed 13-character identifier
///
/// Any other input is returned unchanged. That pass-through is not a valid
/// alternate; use [`isbn10`] when the caller needs to tell the two apart.
pub fn derive_alternate(isbn13: &str) -> String {
    if !isbn13.is_ascii() || isbn13.len() != 13 || !isbn13.starts_with("978") {
        return isbn13.to_string();
    }

    let body = &isbn13[3..12];
    match check_char(body) {
        Some(check) => format!("{}{}", body, check),
        None => isbn13.to_string(),
    }
}

/// The 10-character alternate, or `None` when no alternate exists
pub fn isbn10(isbn13: &str) -> Option<String> {
    let alternate = derive_alternate(isbn13);
    if alternate == isbn13 {
        None
    } else {
        Some(alternate)
    }
}

/// Weighted mod-11 check character over nine digits (weights 10 down to 2)
///
/// Returns `None` if `digits` is not exactly nine ASCII digits.
pub fn check_char(digits: &str) -> Option<char> {
    if digits.len() != 9 {
        return None;
    }

    let mut sum = 0u32;
    for (i, c) in digits.chars().enumerate() {
        let d = c.to_digit(10)?;
        sum += d * (10 - i as u32);
    }

    match (11 - (sum % 11)) % 11 {
        10 => Some('X'),
        n => char::from_digit(n, 10),
    }
}

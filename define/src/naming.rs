//! Identifier case conversions for declared field and object names.
//!
//! Schema authors declare names in CamelCase (`CreatedAt`). Everything else
//! is derived: the wire key is lowerCamel (`createdAt`), the storage
//! identifier is snake_case (`created_at`), and emitted constants are
//! SCREAMING_SNAKE (`CREATED_AT_KEY`). The conversions are deliberately
//! word-based so acronym runs survive (`HTTPServer` -> `http_server`).

/// True when `name` is acceptable as a declared field or object name:
/// non-empty, leading ASCII uppercase letter, ASCII alphanumerics and
/// underscores after that.
pub fn is_declared_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Converts a CamelCase name to lowerCamel (`CreatedAt` -> `createdAt`).
pub fn lower_camel(name: &str) -> String {
    let words = split_words(name);
    let mut out = String::with_capacity(name.len());
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Converts a CamelCase name to snake_case (`CreatedAt` -> `created_at`).
pub fn snake_case(name: &str) -> String {
    let words = split_words(name);
    words
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Converts a CamelCase name to SCREAMING_SNAKE (`ThingNameKey` ->
/// `THING_NAME_KEY`).
pub fn screaming_snake(name: &str) -> String {
    let words = split_words(name);
    words
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Uppercases the first character of a word and lowercases the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Splits a CamelCase string into words, keeping acronym runs together:
/// `HTTPServer` -> `["HTTP", "Server"]`, `CreatedAt` -> `["Created", "At"]`.
fn split_words(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let chars: Vec<char> = s.chars().collect();
    let mut word_start = 0;

    for i in 1..chars.len() {
        let current = chars[i];
        let prev = chars[i - 1];
        let is_new_word = current.is_uppercase()
            && (prev.is_lowercase()
                || prev == '_'
                || (i + 1 < chars.len() && chars[i + 1].is_lowercase() && prev.is_uppercase()));
        if is_new_word && i > word_start {
            words.push(s[word_start..i].trim_matches('_'));
            word_start = i;
        }
    }
    if word_start < s.len() {
        words.push(s[word_start..].trim_matches('_'));
    }
    words.retain(|w| !w.is_empty());
    words
}

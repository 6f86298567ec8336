//! Identifier casing, sanitization, and pluralization.

/// Convert a name to PascalCase for class identifiers.
///
/// Splits on runs of underscores, hyphens, and whitespace, uppercasing
/// the first character and the character after each separator.
pub fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Replace any character outside letters, digits, and underscore with
/// an underscore. Used for column and association-table names.
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Pluralize an English name with a coarse heuristic.
///
/// A name already ending in "s" is treated as already plural and
/// passed through unchanged.
pub fn pluralize(name: &str) -> String {
    if name.ends_with('s') {
        return name.to_string();
    }
    if name.ends_with('x') || name.ends_with('z') || name.ends_with("ch") || name.ends_with("sh") {
        return format!("{name}es");
    }
    let mut rev = name.chars().rev();
    if let (Some('y'), Some(prev)) = (rev.next(), rev.next()) {
        if prev.is_ascii_alphabetic() && !is_vowel(prev) {
            return format!("{}ies", &name[..name.len() - 1]);
        }
    }
    format!("{name}s")
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

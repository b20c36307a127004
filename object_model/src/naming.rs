//! Naming helpers for default relation keys

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "feedback",
    "fish",
    "information",
    "media",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

/// Lowercase the first character
pub fn lcfirst(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// English plural of a camelCase identifier; only the last word is inflected
pub fn pluralize(name: &str) -> String {
    let split = name
        .char_indices()
        .filter(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0);
    let (head, word) = name.split_at(split);
    format!("{}{}", head, pluralize_word(word))
}

fn pluralize_word(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_lowercase();
    let capitalized = word.chars().next().map(char::is_uppercase).unwrap_or(false);

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return if capitalized {
            ucfirst(plural)
        } else {
            plural.to_string()
        };
    }

    let stem = word
        .char_indices()
        .last()
        .map(|(i, _)| &word[..i])
        .unwrap_or(word);
    if lower.ends_with('y') && !ends_with_vowel(stem) {
        return format!("{}ies", stem);
    }
    if lower.ends_with("fe") {
        return format!("{}ves", &word[..word.len() - 2]);
    }
    if lower.ends_with("lf") || lower.ends_with("af") {
        return format!("{}ves", stem);
    }
    if lower.ends_with("sis") {
        return format!("{}es", &word[..word.len() - 2]);
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

fn ends_with_vowel(text: &str) -> bool {
    matches!(
        text.chars().last().map(|c| c.to_ascii_lowercase()),
        Some('a' | 'e' | 'i' | 'o' | 'u')
    )
}

fn ucfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcfirst() {
        assert_eq!(lcfirst("Category"), "category");
        assert_eq!(lcfirst("BlogPost"), "blogPost");
        assert_eq!(lcfirst(""), "");
    }

    #[test]
    fn test_pluralize_regular_words() {
        assert_eq!(pluralize("post"), "posts");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("analysis"), "analyses");
        assert_eq!(pluralize("knife"), "knives");
    }

    #[test]
    fn test_pluralize_camel_case_and_irregular() {
        assert_eq!(pluralize("blogCategory"), "blogCategories");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("salesPerson"), "salesPeople");
        assert_eq!(pluralize("news"), "news");
    }
}

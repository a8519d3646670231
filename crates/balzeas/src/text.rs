use std::sync::LazyLock;

use regex::Regex;

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("invalid regex: email")
});
static RE_ORCID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{4}-\d{4}-\d{4}").expect("invalid regex: orcid"));
static RE_HYPHEN_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*").expect("invalid regex: hyphen spacing"));

// Names whose profile slug does not follow the general rule.
const SLUG_OVERRIDES: &[(&str, &str)] = &[
    ("Jan Lanzer", "jan-david-lanzer"),
    ("Thorben Söhngen", "thorben-hennig"),
];

const CHAR_MAP: &[(char, &str)] = &[
    ('ä', "a"),
    ('ö', "o"),
    ('ü', "u"),
    ('ß', "ss"),
    ('ñ', "n"),
    ('é', "e"),
    ('è', "e"),
    ('ê', "e"),
    ('ë', "e"),
    ('á', "a"),
    ('à', "a"),
    ('â', "a"),
    ('ã', "a"),
    ('å', "a"),
    ('ç', "c"),
    ('í', "i"),
    ('ì', "i"),
    ('î', "i"),
    ('ï', "i"),
    ('ó', "o"),
    ('ò', "o"),
    ('ô', "o"),
    ('õ', "o"),
    ('ú', "u"),
    ('ù', "u"),
    ('û', "u"),
    ('ý', "y"),
    ('ÿ', "y"),
    ('æ', "ae"),
    ('œ', "oe"),
    ('ø', "o"),
    ('ł', "l"),
    ('ń', "n"),
    ('ś', "s"),
    ('ź', "z"),
    ('ż', "z"),
    ('ć', "c"),
    ('ę', "e"),
    ('ą', "a"),
    ('š', "s"),
    ('č', "c"),
    ('ž', "z"),
    ('đ', "d"),
];

/// Turns a display name into the lowercase, hyphen-separated, ASCII-only
/// identifier used as a profile URL segment and image filename stem.
pub fn slugify(name: &str) -> String {
    if let Some((_, slug)) = SLUG_OVERRIDES.iter().find(|(full, _)| *full == name) {
        return (*slug).to_string();
    }

    let mut mapped = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if let Some((_, replacement)) = CHAR_MAP.iter().find(|(from, _)| *from == c) {
            mapped.push_str(replacement);
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c.is_whitespace() {
            mapped.push(c);
        }
    }

    mapped.split_whitespace().collect::<Vec<_>>().join("-")
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trims, collapses whitespace runs and tightens hyphen spacing in date
/// ranges ("2019 - 2021" becomes "2019-2021").
pub fn clean_duration(text: &str) -> String {
    RE_HYPHEN_SPACING
        .replace_all(&normalize_whitespace(text), "-")
        .into_owned()
}

/// Decodes the obfuscated `data-mail` attribute form
/// `domain_part.more_domain.username`: underscores become dots within the
/// first and last segments, reassembled as `username@domain`.
pub fn decode_obfuscated_email(data: &str) -> Option<String> {
    let parts: Vec<&str> = data.split('.').collect();
    if parts.len() < 3 {
        return None;
    }
    let domain = parts[0].replace('_', ".");
    let username = parts[parts.len() - 1].replace('_', ".");
    Some(format!("{}@{}", username, domain))
}

pub fn find_email(text: &str) -> Option<String> {
    RE_EMAIL.find(text).map(|m| m.as_str().to_string())
}

pub fn find_orcid(text: &str) -> Option<String> {
    RE_ORCID.find(text).map(|m| m.as_str().to_string())
}

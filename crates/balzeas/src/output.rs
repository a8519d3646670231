use crate::text::slugify;

use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes the record list as a pretty-printed JSON array, fully replacing
/// any previous file. Non-ASCII text is written as-is (serde_json never
/// escapes UTF-8).
pub fn write_json<T: serde::Serialize>(records: &T, path: impl AsRef<Path>) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    Ok(())
}

/// Derives the local image filename: the record's slug plus the extension
/// of the URL path (query and fragment ignored), falling back to
/// `default_ext` when the path has none.
pub fn image_filename(name: &str, url: &str, default_ext: &str) -> String {
    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    let file = path.rsplit('/').next().unwrap_or("");

    let ext = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => format!(".{}", ext),
        _ => default_ext.to_string(),
    };

    format!("{}{}", slugify(name), ext)
}

/// Writes downloaded image bytes into `dir`, named after the record's slug.
/// Returns the filename to store on the record.
pub fn save_image(
    dir: impl AsRef<Path>,
    name: &str,
    url: &str,
    bytes: &[u8],
    default_ext: &str,
) -> Result<String, OutputError> {
    let filename = image_filename(name, url, default_ext);
    fs::write(dir.as_ref().join(&filename), bytes)?;
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Alumnus, Publication};
    use std::env;

    #[test]
    fn test_json_round_trip_preserves_records_and_unicode() {
        let records = vec![
            Publication {
                title: "Systèmes biology of signalling (ß)".to_string(),
                url: "https://doi.org/10/x".to_string(),
                authors: "Müller J, Söhngen T".to_string(),
                journal: "Molecular Systems Biology".to_string(),
                year: "2021".to_string(),
            },
            Publication {
                title: "Second entry".to_string(),
                url: "https://doi.org/10/y".to_string(),
                authors: "Doe A".to_string(),
                journal: "Bioinformatics".to_string(),
                year: "2019".to_string(),
            },
        ];

        let path = env::temp_dir().join("balzeas_roundtrip_test.json");
        write_json(&records, &path).expect("Failed to write JSON");

        let written = std::fs::read_to_string(&path).expect("Failed to read back");
        assert!(
            written.contains("Müller J, Söhngen T"),
            "Non-ASCII text must be preserved verbatim, got: {}",
            written
        );

        let reread: Vec<Publication> =
            serde_json::from_str(&written).expect("Failed to deserialize");
        assert_eq!(reread, records);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_json_overwrites_previous_content() {
        let path = env::temp_dir().join("balzeas_overwrite_test.json");

        let many = vec![
            Alumnus {
                name: "Mi Yang".to_string(),
                linkedin: String::new(),
                duration: "2014-2019".to_string(),
                position: "PhD student".to_string(),
            };
            3
        ];
        write_json(&many, &path).expect("Failed to write JSON");

        let one = vec![many[0].clone()];
        write_json(&one, &path).expect("Failed to rewrite JSON");

        let reread: Vec<Alumnus> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread.len(), 1, "A run fully replaces the previous file");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_image_filename_takes_extension_from_url_path() {
        assert_eq!(
            image_filename("Jürgen Müller", "https://saezlab.org/uploads/photo.png", ".jpg"),
            "jurgen-muller.png"
        );
    }

    #[test]
    fn test_image_filename_ignores_query_and_fragment() {
        assert_eq!(
            image_filename("Mi Yang", "https://cdn.example.org/a/b.jpeg?size=large#top", ".jpg"),
            "mi-yang.jpeg"
        );
    }

    #[test]
    fn test_image_filename_falls_back_to_default_extension() {
        assert_eq!(
            image_filename("OmniPath", "https://saezlab.org/assets/omnipath", ".png"),
            "omnipath.png"
        );
    }
}

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::protocol::DEFAULT_EMOTION;

/// Catalog bundled with the daemon, used when no playlists file exists yet.
pub const BUNDLED_CATALOG: &str = include_str!("../playlists.toml");

/// Mapping from lookup key (`emotion`, `genre` or `emotion_genre`) to track URIs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistCatalog {
    #[serde(default)]
    pub playlists: HashMap<String, Vec<String>>,
}

impl PlaylistCatalog {
    /// Resolve the playlist for an emotion and optional genre.
    ///
    /// With a genre the combined `emotion_genre` key wins, then the genre on
    /// its own. Without one the emotion key is used. Both paths fall back to
    /// the `neutral` entry and finally to an empty list. An empty genre counts
    /// as none.
    pub fn lookup(&self, emotion: &str, genre: Option<&str>) -> Vec<String> {
        let primary = match genre.filter(|g| !g.is_empty()) {
            Some(genre) => self
                .playlists
                .get(&format!("{}_{}", emotion, genre))
                .or_else(|| self.playlists.get(genre)),
            None => self.playlists.get(emotion),
        };

        primary
            .or_else(|| self.playlists.get(DEFAULT_EMOTION))
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}

pub fn parse_catalog_from_str(content: &str) -> anyhow::Result<PlaylistCatalog> {
    let catalog: PlaylistCatalog = toml::from_str(content)?;
    Ok(catalog)
}

pub fn load_catalog(path: &Path) -> anyhow::Result<PlaylistCatalog> {
    let content = std::fs::read_to_string(path)?;
    parse_catalog_from_str(&content)
}

/// Load `path`, seeding it from the bundled catalog when it does not exist.
pub fn load_or_seed_catalog(path: &Path) -> anyhow::Result<PlaylistCatalog> {
    if !path.exists() {
        warn!("Playlist catalog {:?} not found, seeding bundled catalog", path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, BUNDLED_CATALOG)?;
    }
    load_catalog(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PlaylistCatalog {
        parse_catalog_from_str(
            r#"
            [playlists]
            neutral = ["n1"]
            happy = ["h1", "h2"]
            rock = ["r1"]
            sad_rock = ["sr1", "sr2"]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_combined_key_wins() {
        assert_eq!(catalog().lookup("sad", Some("rock")), vec!["sr1", "sr2"]);
    }

    #[test]
    fn test_genre_fallback() {
        assert_eq!(catalog().lookup("happy", Some("rock")), vec!["r1"]);
    }

    #[test]
    fn test_unknown_genre_falls_back_to_neutral() {
        assert_eq!(catalog().lookup("happy", Some("polka")), vec!["n1"]);
    }

    #[test]
    fn test_emotion_only() {
        assert_eq!(catalog().lookup("happy", None), vec!["h1", "h2"]);
        assert_eq!(catalog().lookup("angry", None), vec!["n1"]);
    }

    #[test]
    fn test_empty_genre_is_no_genre() {
        assert_eq!(catalog().lookup("happy", Some("")), vec!["h1", "h2"]);
        assert_eq!(catalog().lookup("angry", Some("")), vec!["n1"]);
    }

    #[test]
    fn test_empty_catalog_yields_empty_playlist() {
        let empty = PlaylistCatalog::default();
        assert!(empty.lookup("sad", Some("rock")).is_empty());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_bundled_catalog_parses() {
        let bundled = parse_catalog_from_str(BUNDLED_CATALOG).unwrap();
        assert!(!bundled.lookup("neutral", None).is_empty());
        assert!(bundled.len() > 5);
    }
}

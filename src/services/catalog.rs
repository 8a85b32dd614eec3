use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::Movie,
};

/// Ordered, immutable collection of movies addressed by position
///
/// Positions are the row/column indices of the similarity matrix, so the
/// order of the catalog artifact is significant and never changes after load.
///
/// Titles are not guaranteed to be unique. The title index maps each title to
/// the *first* position carrying it; later duplicates are reachable by
/// position only. This is an accepted limitation of the dataset.
#[derive(Debug, Clone)]
pub struct Catalog {
    movies: Vec<Movie>,
    by_title: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog and its first-match title index
    pub fn new(movies: Vec<Movie>) -> Self {
        let mut by_title = HashMap::with_capacity(movies.len());
        for (position, movie) in movies.iter().enumerate() {
            by_title.entry(movie.title.clone()).or_insert(position);
        }

        Self { movies, by_title }
    }

    /// Deserializes a JSON array of movie records
    pub fn from_json(bytes: &[u8]) -> AppResult<Self> {
        let movies: Vec<Movie> = serde_json::from_slice(bytes)
            .map_err(|e| AppError::DataCorrupt(format!("catalog: {}", e)))?;
        Ok(Self::new(movies))
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Position of the first movie whose title is exactly `title`
    pub fn resolve(&self, title: &str) -> AppResult<usize> {
        self.by_title
            .get(title)
            .copied()
            .ok_or_else(|| AppError::NotFound(title.to_string()))
    }

    /// Case-insensitive variant of [`Catalog::resolve`]
    ///
    /// An exact hit always wins; otherwise the catalog is scanned in order.
    pub fn resolve_ignore_case(&self, title: &str) -> AppResult<usize> {
        if let Ok(position) = self.resolve(title) {
            return Ok(position);
        }

        let needle = title.to_lowercase();
        self.movies
            .iter()
            .position(|movie| movie.title.to_lowercase() == needle)
            .ok_or_else(|| AppError::NotFound(title.to_string()))
    }

    pub fn entry_at(&self, position: usize) -> AppResult<&Movie> {
        self.movies.get(position).ok_or(AppError::OutOfRange {
            position,
            len: self.movies.len(),
        })
    }

    /// Movies whose title contains `query`, ignoring case, in catalog order
    pub fn search(&self, query: &str, limit: usize) -> Vec<(usize, &Movie)> {
        let needle = query.trim().to_lowercase();
        self.iter()
            .filter(|(_, movie)| needle.is_empty() || movie.title.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Movie)> {
        self.movies.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieId;

    fn sample_catalog() -> Catalog {
        Catalog::new(vec![
            Movie::new(19995_u64, "Avatar"),
            Movie::new(285_u64, "Pirates of the Caribbean: At World's End"),
            Movie::new(206647_u64, "Spectre"),
            Movie::new(9999_u64, "Avatar"),
        ])
    }

    #[test]
    fn test_resolve_exact_match() {
        let catalog = sample_catalog();
        assert_eq!(catalog.resolve("Spectre").unwrap(), 2);
    }

    #[test]
    fn test_resolve_duplicate_title_returns_first_position() {
        let catalog = sample_catalog();
        assert_eq!(catalog.resolve("Avatar").unwrap(), 0);
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let catalog = sample_catalog();
        assert!(matches!(
            catalog.resolve("spectre"),
            Err(AppError::NotFound(t)) if t == "spectre"
        ));
    }

    #[test]
    fn test_resolve_does_not_trim() {
        let catalog = sample_catalog();
        assert!(catalog.resolve(" Spectre").is_err());
    }

    #[test]
    fn test_resolve_ignore_case() {
        let catalog = sample_catalog();
        assert_eq!(catalog.resolve_ignore_case("SPECTRE").unwrap(), 2);
        assert_eq!(catalog.resolve_ignore_case("avatar").unwrap(), 0);
        assert!(catalog.resolve_ignore_case("Skyfall").is_err());
    }

    #[test]
    fn test_entry_at() {
        let catalog = sample_catalog();
        let movie = catalog.entry_at(2).unwrap();
        assert_eq!(movie.id, MovieId::Numeric(206647));
        assert_eq!(movie.title, "Spectre");
    }

    #[test]
    fn test_entry_at_out_of_range() {
        let catalog = sample_catalog();
        assert!(matches!(
            catalog.entry_at(4),
            Err(AppError::OutOfRange { position: 4, len: 4 })
        ));
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let catalog = sample_catalog();
        let hits: Vec<usize> = catalog.search("av", 10).into_iter().map(|(p, _)| p).collect();
        assert_eq!(hits, vec![0, 3]);
    }

    #[test]
    fn test_search_respects_limit_and_blank_query() {
        let catalog = sample_catalog();
        assert_eq!(catalog.search("   ", 2).len(), 2);
        assert_eq!(catalog.search("caribbean", 0).len(), 0);
    }

    #[test]
    fn test_from_json() {
        let json = br#"[
            {"movie_id": 19995, "title": "Avatar"},
            {"movie_id": 285, "title": "Pirates of the Caribbean: At World's End"}
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.resolve("Avatar").unwrap(), 0);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            Catalog::from_json(b"not json"),
            Err(AppError::DataCorrupt(_))
        ));
    }
}

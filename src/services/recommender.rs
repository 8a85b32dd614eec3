use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, ScoredMovie},
    services::{catalog::Catalog, similarity::SimilarityMatrix},
};

/// Number of recommendations returned when the caller has no preference
pub const DEFAULT_K: usize = 5;

/// Upper bound on recommendations per request
pub const DEFAULT_MAX_K: usize = 50;

/// How a query title is matched against catalog titles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleMatch {
    /// Exact, case-sensitive comparison
    #[default]
    Exact,
    /// Unicode lowercase comparison, exact hits still preferred
    IgnoreCase,
}

/// Outcome of a recommendation request
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    /// The title resolved; `items` are ranked best first and may be empty
    /// when `k` is zero or the catalog holds a single movie
    Ranked {
        query: Movie,
        position: usize,
        items: Vec<ScoredMovie>,
    },
    /// No catalog title matched the query
    UnknownTitle(String),
}

impl Recommendation {
    /// Flattens the outcome into the recommended movies, empty for an unknown title
    pub fn into_movies(self) -> Vec<Movie> {
        match self {
            Recommendation::Ranked { items, .. } => items.into_iter().map(|s| s.movie).collect(),
            Recommendation::UnknownTitle(_) => Vec::new(),
        }
    }
}

/// The loaded dataset: a catalog and the similarity matrix over its positions
///
/// Constructed once at startup and shared read-only afterwards.
#[derive(Debug)]
pub struct Recommender {
    catalog: Catalog,
    similarity: SimilarityMatrix,
    loaded_at: DateTime<Utc>,
}

impl Recommender {
    /// Pairs a catalog with its matrix; the matrix dimension must equal the catalog length
    pub fn new(catalog: Catalog, similarity: SimilarityMatrix) -> AppResult<Self> {
        if similarity.dim() != catalog.len() {
            return Err(AppError::DataCorrupt(format!(
                "similarity matrix is {0}x{0} but the catalog has {1} movies",
                similarity.dim(),
                catalog.len()
            )));
        }

        Ok(Self {
            catalog,
            similarity,
            loaded_at: Utc::now(),
        })
    }

    /// Deserializes both artifacts and pairs them
    pub fn from_bytes(catalog_bytes: &[u8], similarity_bytes: &[u8]) -> AppResult<Self> {
        let catalog = Catalog::from_json(catalog_bytes)?;
        let similarity = SimilarityMatrix::from_json(similarity_bytes)?;
        Self::new(catalog, similarity)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Recommends the `k` movies most similar to `title` using exact matching
    pub fn recommend(&self, title: &str, k: usize) -> AppResult<Recommendation> {
        self.recommend_with(title, k, TitleMatch::Exact)
    }

    #[instrument(skip(self), level = "debug")]
    pub fn recommend_with(
        &self,
        title: &str,
        k: usize,
        matching: TitleMatch,
    ) -> AppResult<Recommendation> {
        let resolved = match matching {
            TitleMatch::Exact => self.catalog.resolve(title),
            TitleMatch::IgnoreCase => self.catalog.resolve_ignore_case(title),
        };

        let position = match resolved {
            Ok(position) => position,
            Err(AppError::NotFound(_)) => {
                tracing::info!(title = %title, "No catalog entry for title");
                return Ok(Recommendation::UnknownTitle(title.to_string()));
            }
            Err(e) => return Err(e),
        };

        let items = self
            .similarity
            .top_k_similar(position, k)?
            .into_iter()
            .map(|neighbor| -> AppResult<ScoredMovie> {
                let movie = self.catalog.entry_at(neighbor.position)?.clone();
                Ok(ScoredMovie {
                    position: neighbor.position,
                    movie,
                    score: neighbor.score,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        tracing::debug!(position, results = items.len(), "Ranked similar movies");

        Ok(Recommendation::Ranked {
            query: self.catalog.entry_at(position)?.clone(),
            position,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Recommender {
        let catalog = Catalog::new(vec![
            Movie::new(0_u64, "A"),
            Movie::new(1_u64, "B"),
            Movie::new(2_u64, "C"),
            Movie::new(3_u64, "D"),
        ]);
        let similarity = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.9, 0.1],
            vec![0.9, 1.0, 0.3, 0.2],
            vec![0.9, 0.3, 1.0, 0.5],
            vec![0.1, 0.2, 0.5, 1.0],
        ])
        .unwrap();
        Recommender::new(catalog, similarity).unwrap()
    }

    fn titles(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.title.as_str()).collect()
    }

    #[test]
    fn test_recommend_ranks_with_position_tie_break() {
        let movies = scenario().recommend("A", 2).unwrap().into_movies();
        assert_eq!(titles(&movies), vec!["B", "C"]);
    }

    #[test]
    fn test_recommend_unknown_title() {
        let recommender = scenario();
        let outcome = recommender.recommend("Z", DEFAULT_K).unwrap();
        assert_eq!(outcome, Recommendation::UnknownTitle("Z".to_string()));
        assert!(outcome.into_movies().is_empty());
    }

    #[test]
    fn test_recommend_carries_query_and_scores() {
        match scenario().recommend("D", 1).unwrap() {
            Recommendation::Ranked {
                query,
                position,
                items,
            } => {
                assert_eq!(query.title, "D");
                assert_eq!(position, 3);
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].movie.title, "C");
                assert_eq!(items[0].position, 2);
                assert_eq!(items[0].score, 0.5);
            }
            other => panic!("expected ranked outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_recommend_zero_k_resolves_but_is_empty() {
        let outcome = scenario().recommend("A", 0).unwrap();
        assert!(matches!(outcome, Recommendation::Ranked { ref items, .. } if items.is_empty()));
    }

    #[test]
    fn test_recommend_ignore_case_is_opt_in() {
        let recommender = scenario();
        assert!(matches!(
            recommender.recommend("a", 2).unwrap(),
            Recommendation::UnknownTitle(_)
        ));
        let movies = recommender
            .recommend_with("a", 2, TitleMatch::IgnoreCase)
            .unwrap()
            .into_movies();
        assert_eq!(titles(&movies), vec!["B", "C"]);
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let recommender = scenario();
        let first = recommender.recommend("C", 3).unwrap();
        for _ in 0..10 {
            assert_eq!(recommender.recommend("C", 3).unwrap(), first);
        }
    }

    #[test]
    fn test_dimension_mismatch_is_data_corrupt() {
        let catalog = Catalog::new(vec![Movie::new(0_u64, "A"), Movie::new(1_u64, "B")]);
        let similarity = SimilarityMatrix::from_rows(vec![vec![1.0]]).unwrap();
        assert!(matches!(
            Recommender::new(catalog, similarity),
            Err(AppError::DataCorrupt(_))
        ));
    }

    #[test]
    fn test_from_bytes() {
        let recommender = Recommender::from_bytes(
            br#"[{"movie_id": 1, "title": "A"}, {"movie_id": 2, "title": "B"}]"#,
            b"[[1.0, 0.2], [0.2, 1.0]]",
        )
        .unwrap();
        let movies = recommender.recommend("A", DEFAULT_K).unwrap().into_movies();
        assert_eq!(titles(&movies), vec!["B"]);
    }
}

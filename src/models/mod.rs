use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// External identifier of a movie, opaque to the recommender
///
/// The catalog artifact carries TMDB's numeric ids, but any string id is
/// accepted and passed through unchanged to the poster resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MovieId {
    Numeric(u64),
    Text(String),
}

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovieId::Numeric(id) => write!(f, "{}", id),
            MovieId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<u64> for MovieId {
    fn from(id: u64) -> Self {
        MovieId::Numeric(id)
    }
}

impl From<&str> for MovieId {
    fn from(id: &str) -> Self {
        MovieId::Text(id.to_string())
    }
}

/// A catalog record: the external id and display title of one movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// `movie_id` is the column name in the exported dataset
    #[serde(rename = "movie_id", alias = "id")]
    pub id: MovieId,
    pub title: String,
}

impl Movie {
    pub fn new(id: impl Into<MovieId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A recommended movie together with its catalog position and similarity score
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredMovie {
    pub position: usize,
    pub movie: Movie,
    pub score: f64,
}

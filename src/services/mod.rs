pub mod artifacts;
pub mod catalog;
pub mod posters;
pub mod recommender;
pub mod similarity;

pub use catalog::Catalog;
pub use recommender::{Recommendation, Recommender, TitleMatch};
pub use similarity::{Neighbor, SimilarityMatrix};

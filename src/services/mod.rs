pub mod corpus;
pub mod embedding;
pub mod normalizer;
pub mod pipeline;
pub mod recommender;
pub mod similarity;
pub mod sources;
pub mod vectorizer;

pub use corpus::CorpusBuilder;
pub use embedding::{EmbeddingModel, EmbeddingTrainer, TrainingConfig};
pub use normalizer::TextNormalizer;
pub use pipeline::{rebuild, RebuildReport};
pub use recommender::{Candidate, Recommender};
pub use similarity::SimilarityMatrix;
pub use sources::{CatalogSource, JsonFileSource};

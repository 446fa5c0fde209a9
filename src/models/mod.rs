pub mod catalog;
pub mod movie;
pub mod screening;

pub use catalog::{Catalog, CorpusEntry};
pub use movie::{HistoricalMovie, MovieRecord};
pub use screening::Screening;

pub mod artifacts;
pub mod manifest;

pub use artifacts::{Artifact, ArtifactSet, ArtifactStore, Snapshot};
pub use manifest::Manifest;

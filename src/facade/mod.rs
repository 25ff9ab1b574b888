pub mod engine;

pub use engine::{ArtifactSummary, BackupEngine, BackupStats};

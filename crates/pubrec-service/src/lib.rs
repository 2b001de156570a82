//! pubrec-service
//!
//! Orchestration of the ingestion-to-index pipeline and the
//! recommendation query layer: working-directory lifecycle, single-writer
//! build locking, atomic index publish, and the paginated recommend/rank
//! surface.

pub mod layout;
pub mod lifecycle;
pub mod recommend;

pub use layout::WorkLayout;
pub use lifecycle::{BuildReport, BuildStage, IndexLifecycle};
pub use recommend::RecommenderService;

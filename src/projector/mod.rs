//! View Projection
//!
//! Maps snapshots to render instructions and suppresses redundant redraws.
//!
//! - **instruction**: the toolkit-independent instruction types
//! - **projector**: per-topic projection, render-state diffing and the
//!   renderer registry

mod instruction;
#[allow(clippy::module_inception)]
mod projector;

pub use instruction::{
    ArticleRow, ChartData, Dataset, KeywordRow, ListRow, RenderInstruction, StatCard,
};
pub use projector::{build_instruction, ProjectorConfig, Renderer, ViewProjector};

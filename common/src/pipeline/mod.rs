pub mod executor;
pub mod stage;
pub mod state;

pub use executor::{Pipeline, PipelineOutput, StageTiming};
pub use stage::{PipelineContext, SqlExecutionStage, SqlGenerationStage, Stage, SummarizationStage};
pub use state::{PipelineState, PipelineStep};

use crate::error::{AskDbError, Result};
use crate::pipeline::stage::{
    PipelineContext, SqlExecutionStage, SqlGenerationStage, Stage, SummarizationStage,
};
use crate::pipeline::state::{PipelineState, PipelineStep};
use serde::Serialize;
use tracing::Instrument;

/// time spent in one stage
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: String,
    pub duration_ms: u64,
}

/// what a caller gets back from a run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub sql: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageTiming>,
}

/// runs sql generation, execution and summarization in order
pub struct Pipeline {
    ctx: PipelineContext,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx,
            stages: vec![
                Box::new(SqlGenerationStage),
                Box::new(SqlExecutionStage),
                Box::new(SummarizationStage),
            ],
        }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// answer a question, returning the sql used and the summary
    pub async fn run(&self, question: &str) -> Result<PipelineOutput> {
        let (state, stages) = self.execute(PipelineState::new(question)).await?;

        Ok(PipelineOutput {
            sql: state.sql()?.to_string(),
            answer: state.summary()?.to_string(),
            stages,
        })
    }

    /// drive a state through every stage and return the final state
    pub async fn execute(&self, state: PipelineState) -> Result<(PipelineState, Vec<StageTiming>)> {
        let span = tracing::info_span!(
            "pipeline::execute",
            pipeline.stage_count = self.stages.len(),
            question_len = state.question.len()
        );

        async move {
            tracing::info!("running pipeline");

            let mut state = state;
            let mut timings = Vec::with_capacity(self.stages.len());

            for stage in &self.stages {
                let stage_span = tracing::info_span!(
                    "stage",
                    stage.id = %stage.id(),
                    otel.kind = "internal"
                );

                let start = std::time::Instant::now();
                state = stage.run(state, &self.ctx).instrument(stage_span).await?;
                let duration_ms = start.elapsed().as_millis() as u64;

                tracing::info!(
                    stage.id = %stage.id(),
                    stage.duration_ms = duration_ms,
                    step = state.step.as_str(),
                    "stage completed"
                );

                timings.push(StageTiming {
                    stage: stage.id().to_string(),
                    duration_ms,
                });
            }

            if state.step != PipelineStep::Summarized {
                return Err(AskDbError::Pipeline(format!(
                    "pipeline stopped at step '{}'",
                    state.step.as_str()
                )));
            }

            tracing::info!("pipeline complete");
            Ok((state, timings))
        }
        .instrument(span)
        .await
    }
}

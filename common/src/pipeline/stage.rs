use crate::agent::executor::{generate_sql, summarize};
use crate::database::{Database, QueryOutcome};
use crate::error::{AskDbError, Result};
use crate::llm::model::LanguageModel;
use crate::pipeline::state::{PipelineState, PipelineStep};
use async_trait::async_trait;
use std::sync::Arc;

/// dependencies shared by every stage of a run
#[derive(Clone)]
pub struct PipelineContext {
    pub model: Arc<dyn LanguageModel>,
    pub database: Database,
}

impl PipelineContext {
    pub fn new(model: Arc<dyn LanguageModel>, database: Database) -> Self {
        Self { model, database }
    }
}

/// one step of the pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    /// unique identifier for this stage
    fn id(&self) -> &str;

    /// consume the state and return it with this stage's fields filled in
    async fn run(&self, state: PipelineState, ctx: &PipelineContext) -> Result<PipelineState>;
}

/// stage that asks the model for sql
pub struct SqlGenerationStage;

#[async_trait]
impl Stage for SqlGenerationStage {
    fn id(&self) -> &str {
        "sql_generation"
    }

    #[tracing::instrument(skip(self, state, ctx), fields(stage.id = %self.id()))]
    async fn run(&self, state: PipelineState, ctx: &PipelineContext) -> Result<PipelineState> {
        state.expect_step(PipelineStep::Start)?;

        let database = ctx.database.clone();
        let table_info = tokio::task::spawn_blocking(move || database.table_info())
            .await
            .map_err(|e| AskDbError::Pipeline(format!("schema task join error: {}", e)))??;

        let sql = generate_sql(ctx.model.as_ref(), &state.question, &table_info).await?;

        tracing::info!(sql_length = sql.len(), "sql generated");
        Ok(state.with_sql(sql))
    }
}

/// stage that runs the generated sql
pub struct SqlExecutionStage;

#[async_trait]
impl Stage for SqlExecutionStage {
    fn id(&self) -> &str {
        "sql_execution"
    }

    #[tracing::instrument(skip(self, state, ctx), fields(stage.id = %self.id()))]
    async fn run(&self, state: PipelineState, ctx: &PipelineContext) -> Result<PipelineState> {
        state.expect_step(PipelineStep::SqlGenerated)?;

        let sql = state.sql()?.to_string();
        let database = ctx.database.clone();

        // execution problems of any kind end up in the outcome
        let outcome = tokio::task::spawn_blocking(move || database.run(&sql))
            .await
            .unwrap_or_else(|e| QueryOutcome::Failed(format!("execution task failed: {}", e)));

        tracing::info!(failed = outcome.is_failure(), "sql executed");
        Ok(state.with_query_result(outcome))
    }
}

/// stage that turns the query outcome into an answer
pub struct SummarizationStage;

#[async_trait]
impl Stage for SummarizationStage {
    fn id(&self) -> &str {
        "summarization"
    }

    #[tracing::instrument(skip(self, state, ctx), fields(stage.id = %self.id()))]
    async fn run(&self, state: PipelineState, ctx: &PipelineContext) -> Result<PipelineState> {
        state.expect_step(PipelineStep::Executed)?;

        let summary = summarize(ctx.model.as_ref(), &state.question, state.query_result()?).await?;

        tracing::info!(summary_length = summary.len(), "summary produced");
        Ok(state.with_summary(summary))
    }
}

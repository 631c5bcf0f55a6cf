use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use common::database::{Database, DatabaseConfig, DEFAULT_SAMPLE_ROWS};
use common::llm::{OllamaConfig, OllamaModel};
use common::pipeline::{Pipeline, PipelineContext};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "askdb")]
#[command(about = "ask questions of a sqlite database in plain language", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DatabaseArgs {
    /// SQLite database file
    #[arg(long, global = true, env = "ASKDB_DATABASE", default_value = "sample.db")]
    database: PathBuf,

    /// Sample rows per table included in the schema description
    #[arg(long, global = true, default_value_t = DEFAULT_SAMPLE_ROWS)]
    sample_rows: usize,
}

#[derive(Args)]
struct ModelArgs {
    /// Ollama model name
    #[arg(long, env = "ASKDB_MODEL")]
    model: Option<String>,

    /// Ollama server URL
    #[arg(long, env = "OLLAMA_HOST")]
    ollama_url: Option<String>,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Request timeout for each model call, in seconds
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question: generate SQL, run it and summarize the result
    Query {
        /// Natural-language question
        question: String,

        #[command(flatten)]
        model: ModelArgs,

        /// Print {"sql", "answer"} as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Print the schema description sent to the model
    Schema,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let _guard = common::tracing::init_tracing("askdb")?;

        let database = open_database(&self.database)?;

        match self.command {
            Commands::Query {
                question,
                model,
                json,
            } => run_query(database, question, model, json).await,
            Commands::Schema => print_schema(database).await,
        }
    }
}

fn open_database(args: &DatabaseArgs) -> Result<Database> {
    // sqlite would silently create an empty file
    if !args.database.exists() {
        anyhow::bail!("database not found: {}", args.database.display());
    }

    let config = DatabaseConfig {
        sample_rows: args.sample_rows,
    };

    Database::open(&args.database, config)
        .with_context(|| format!("failed to open {}", args.database.display()))
}

fn ollama_config(args: ModelArgs) -> Result<OllamaConfig> {
    if !args.temperature.is_finite() || args.temperature < 0.0 {
        anyhow::bail!("temperature must be a non-negative number");
    }

    Ok(OllamaConfig {
        temperature: args.temperature,
        timeout: Duration::from_secs(args.timeout_secs),
        ..OllamaConfig::resolve(args.ollama_url, args.model)
    })
}

async fn run_query(database: Database, question: String, model: ModelArgs, json: bool) -> Result<()> {
    let question = question.trim().to_string();
    if question.is_empty() {
        anyhow::bail!("question must not be empty");
    }

    let model = OllamaModel::new(ollama_config(model)?)?;
    let pipeline = Pipeline::new(PipelineContext::new(Arc::new(model), database));

    tracing::info!("answering question");
    let output = pipeline.run(&question).await?;

    for timing in &output.stages {
        tracing::info!(stage = %timing.stage, duration_ms = timing.duration_ms, "stage timing");
    }

    if json {
        let body = serde_json::json!({
            "sql": output.sql,
            "answer": output.answer,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("SQL:\n{}\n\nAnswer:\n{}", output.sql, output.answer);
    }

    Ok(())
}

async fn print_schema(database: Database) -> Result<()> {
    let table_info = tokio::task::spawn_blocking(move || database.table_info())
        .await
        .context("schema task failed")??;

    println!("{}", table_info);
    Ok(())
}

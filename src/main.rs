use clap::Parser;
use redindex::{
    config, logging,
    pipeline::{IngestionService, RunParams},
};

#[derive(Parser)]
#[command(
    name = "redindex",
    about = "Index the contents of a Redis-compatible store into a Qdrant collection"
)]
struct Cli {
    /// Target Qdrant collection (defaults to QDRANT_COLLECTION_NAME).
    #[arg(long)]
    collection: Option<String>,
    /// Identifier recorded on every document produced by this run
    /// (defaults to DATA_SOURCE_ID, then to the collection name).
    #[arg(long)]
    data_source_id: Option<String>,
    /// Inclusion rule: keys must match at least one to be ingested. Repeatable.
    #[arg(long = "include", value_name = "REGEX")]
    inclusion_rules: Vec<String>,
    /// Exclusion rule: matching keys are dropped. Repeatable.
    #[arg(long = "exclude", value_name = "REGEX")]
    exclusion_rules: Vec<String>,
}

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();
    let cli = Cli::parse();
    let config = config::get_config();

    let collection = cli
        .collection
        .unwrap_or_else(|| config.qdrant_collection_name.clone());
    let data_source_id = cli
        .data_source_id
        .or_else(|| config.data_source_id.clone())
        .unwrap_or_else(|| collection.clone());

    let service = match IngestionService::new() {
        Ok(service) => service,
        Err(error) => {
            tracing::error!(error = %error, "Failed to initialize ingestion service");
            std::process::exit(1);
        }
    };

    let params = RunParams {
        collection,
        data_source_id,
        inclusion_rules: cli.inclusion_rules,
        exclusion_rules: cli.exclusion_rules,
    };

    match service.run(params).await {
        Ok(outcome) => {
            tracing::info!(
                documents_loaded = outcome.documents_loaded,
                documents_kept = outcome.documents_kept,
                documents_dropped = outcome.documents_dropped,
                keys_skipped = outcome.keys_skipped,
                chunks_indexed = outcome.chunks_indexed,
                store_unreachable = outcome.store_unreachable,
                "Indexing completed"
            );
        }
        Err(error) => {
            tracing::error!(error = %error, "Indexing failed");
            std::process::exit(1);
        }
    }
}

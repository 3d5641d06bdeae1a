use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use newsmood::cli::{Cli, Commands};
use newsmood::config::Config;
use newsmood::errors::{MoodError, MoodResult};
use newsmood::services::{load_dataset, validate_url, DefaultSentimentService, EvaluationService};
use newsmood::web;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsmood=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Load configuration
    let config = Config::from_env()?;

    let service = DefaultSentimentService::from_config(&config)?;

    match cli.command {
        Commands::Classify { url, subject } => cmd_classify(&service, &url, &subject),
        Commands::Extract { url } => cmd_extract(&service, &url)?,
        Commands::Evaluate { dataset, threads } => cmd_evaluate(&service, &dataset, threads)?,
        Commands::Check => cmd_check(&service, &config)?,
        Commands::Serve { bind } => cmd_serve(service, &bind)?,
    }

    Ok(())
}

fn cmd_classify(service: &DefaultSentimentService, url: &str, subject: &str) {
    println!("{}", service.get_sentiment(url, subject));
}

fn cmd_extract(service: &DefaultSentimentService, url: &str) -> MoodResult<()> {
    validate_url(url)?;

    let article = service.fetch_article(url)?;
    if article.is_empty() {
        println!("No paragraph text found.");
    } else {
        println!("{}", article);
    }

    Ok(())
}

fn cmd_evaluate(service: &DefaultSentimentService, path: &str, threads: usize) -> MoodResult<()> {
    let examples = load_dataset(path)?;

    println!(
        "Evaluating {} examples with {} threads...\n",
        examples.len(),
        threads
    );

    let report = EvaluationService::new(service, threads).evaluate(&examples);
    println!("{}", report.format());

    Ok(())
}

fn cmd_check(service: &DefaultSentimentService, config: &Config) -> MoodResult<()> {
    let classifier = service.classifier();

    println!("Backend: {}", config.ollama_url);
    println!("Model:   {}", classifier.model());

    if classifier.model_available()? {
        println!("\nModel is available.");
        return Ok(());
    }

    let models = classifier.available_models()?;
    println!("\nModel is not installed. Available models:");
    if models.is_empty() {
        println!("  (none)");
    }
    for name in &models {
        println!("  {}", name);
    }

    Err(MoodError::Model(format!(
        "model '{}' not found",
        classifier.model()
    )))
}

fn cmd_serve(service: DefaultSentimentService, bind: &str) -> anyhow::Result<()> {
    let service = Arc::new(service);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // The outer handle keeps the blocking HTTP clients alive until the
    // runtime is gone; they must not be dropped on an async worker.
    let result = runtime.block_on(web::run_server(Arc::clone(&service), bind));
    drop(runtime);
    drop(service);

    result
}

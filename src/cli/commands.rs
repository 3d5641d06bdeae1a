use clap::{Parser, Subcommand};

use crate::services::evaluation_service::DEFAULT_THREADS;

#[derive(Parser)]
#[command(name = "newsmood")]
#[command(about = "Classify how a news article portrays a person of interest")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify the sentiment of an article towards a person
    Classify {
        /// Article URL (https only)
        url: String,

        /// Person of interest
        subject: String,
    },

    /// Print the paragraph text extracted from an article
    Extract {
        /// Article URL (https only)
        url: String,
    },

    /// Measure classifier accuracy against a labelled JSON dataset
    Evaluate {
        /// Path to a JSON array of {subject, sentiment, article | url}
        dataset: String,

        /// Number of examples classified in parallel
        #[arg(short, long, default_value_t = DEFAULT_THREADS)]
        threads: usize,
    },

    /// Check that the language model backend serves the configured model
    Check,

    /// Serve the web form
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "NEWSMOOD_BIND", default_value = "127.0.0.1:7860")]
        bind: String,
    },
}

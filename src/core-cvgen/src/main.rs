use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use core_cvgen::{
    ChatGpt, FirecrawlScraper, GenerationInput, JobLifecycleController, LlmTextGenerator, ProcessOutcome, Scraper,
    TextGenerator, is_valid_url, setup_cli_logging,
};
use data_model_cvgen::models::{JobPosting, UserProfile};
use data_model_cvgen::{MemoryDispatcher, MemoryJobStore};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Parser)]
#[command(name = "cvgen")]
#[command(about = "One-off job posting scrapes and application material generation", long_about = None)]
struct CoreCli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a job posting and print its structured fields as JSON.
    Scrape {
        /// The job posting URL.
        #[arg(short, long, value_parser = validate_url)]
        url: String,
    },

    /// Generate a CV, motivation letter and compatibility score for a saved posting.
    Generate {
        /// JSON file holding a scraped job posting (the output of `scrape`).
        #[arg(short, long, value_parser = validate_input_file)]
        job_data: PathBuf,
        /// JSON file holding the applicant's profile.
        #[arg(short, long, value_parser = validate_input_file)]
        profile: Option<PathBuf>,
    },

    /// Run a whole job in-process (scrape, dispatch, generate) and print the final job status.
    Run {
        /// The job posting URL.
        #[arg(short, long, value_parser = validate_url)]
        url: String,
        /// JSON file holding the applicant's profile.
        #[arg(short, long, value_parser = validate_input_file)]
        profile: Option<PathBuf>,
    },
}

fn validate_url(s: &str) -> Result<String, String> {
    is_valid_url(s).map(|u| u.to_string()).map_err(|e| e.to_string())
}

fn validate_input_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);

    if !path.exists() {
        return Err(format!("Input path does not exist: {}", path.display()));
    }

    if !path.is_file() {
        return Err(format!("Input path is not a file: {}", path.display()));
    }

    let metadata = std::fs::metadata(&path).map_err(|e| format!("Cannot read file metadata: {}", e))?;

    if metadata.len() == 0 {
        return Err(format!("Input file is empty: {}", path.display()));
    }

    Ok(path)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    setup_cli_logging("core_cvgen=info");

    let cli = CoreCli::parse();

    match cli.command {
        Commands::Scrape { url } => {
            let scraper = or_exit(FirecrawlScraper::from_env(), "Cannot configure scraper");
            let url = or_exit(is_valid_url(&url), "Invalid URL");
            let posting = or_exit(scraper.extract(&url).await, "Scrape failed");
            print_json(&posting);
        }

        Commands::Generate { job_data, profile } => {
            let input = GenerationInput {
                job_posting: read_json::<JobPosting>(&job_data),
                user_profile: profile.as_ref().map(read_json::<UserProfile>),
            };
            let generator = LlmTextGenerator::new(ChatGpt::from_env());
            let content = or_exit(generator.generate(&input).await, "Generation failed");
            print_json(&content);
        }

        Commands::Run { url, profile } => {
            let user_profile = profile.as_ref().map(read_json::<UserProfile>);
            let scraper = or_exit(FirecrawlScraper::from_env(), "Cannot configure scraper");
            let dispatcher = Arc::new(MemoryDispatcher::new());
            let controller = JobLifecycleController::new(
                Arc::new(MemoryJobStore::new()),
                Arc::new(scraper),
                Arc::new(LlmTextGenerator::new(ChatGpt::from_env())),
                dispatcher.clone(),
            );

            let job_id = or_exit(controller.submit(&url, user_profile).await, "Submit failed");
            while let Some(request) = dispatcher.pop() {
                match or_exit(controller.process(&request).await, "Processing failed") {
                    ProcessOutcome::Failed(e) => tracing::warn!("[job: {}] Generation failed: {}", job_id, e),
                    outcome => tracing::debug!("[job: {}] {:?}", job_id, outcome),
                }
            }

            let view = or_exit(controller.get_status(job_id).await, "Cannot read job status");
            print_json(&view);
        }
    }
}

fn read_json<T: DeserializeOwned>(file: &PathBuf) -> T {
    let content = or_exit(std::fs::read_to_string(file), &format!("Cannot read file ({file:?})"));
    or_exit(serde_json::from_str(&content), &format!("Invalid JSON in file ({file:?})"))
}

fn print_json<T: Serialize>(value: &T) {
    let json = or_exit(serde_json::to_string_pretty(value), "Cannot serialize output");
    println!("{json}");
}

fn or_exit<T, E: std::fmt::Display>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(x) => x,
        Err(e) => {
            eprintln!("ERROR: {context}: {e}");
            std::process::exit(1)
        }
    }
}

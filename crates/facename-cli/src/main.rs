//! facename CLI: generate face-name pairs, query them, and train on them.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use facename_core::model::{Age, Gender};
use facename_core::quiz::Course;

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "facename", version, about = "Face-name memory trainer")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and the default name lists
    Init,

    /// Generate new face-name pairs
    Generate {
        /// Number of pairs
        #[arg(long, default_value = "1")]
        count: usize,

        /// Age bucket (20, 30, 40, 50, 60, 70)
        #[arg(long)]
        age: Option<Age>,

        /// Gender bucket (male, female)
        #[arg(long)]
        gender: Option<Gender>,
    },

    /// Fetch stored pairs at random, generating any shortfall
    Random {
        /// Number of pairs (default: trainer.person_count)
        #[arg(long)]
        count: Option<usize>,

        #[arg(long)]
        age: Option<Age>,

        #[arg(long)]
        gender: Option<Gender>,
    },

    /// Show one stored pair
    Show {
        /// Pair id
        id: String,
    },

    /// Answer a query string, e.g. "action=get_random_pairs&count=3"
    Query {
        query: String,
    },

    /// Run a monitored batch of generations
    Batch {
        #[arg(long, default_value = "10")]
        count: usize,

        #[arg(long)]
        age: Option<Age>,

        #[arg(long)]
        gender: Option<Gender>,

        /// Write an HTML statistics page here
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Memorize pairs, then take a test
    Train {
        /// Number of pairs to memorize (default: trainer.person_count)
        #[arg(long)]
        count: Option<usize>,

        /// Seconds per pair (default: trainer.display_time_secs)
        #[arg(long)]
        display_time: Option<u32>,

        /// Test course: a (name to face) or b (face to name)
        #[arg(long)]
        course: Option<Course>,

        /// Number of questions (default: every memorized pair)
        #[arg(long)]
        questions: Option<usize>,

        #[arg(long)]
        age: Option<Age>,

        #[arg(long)]
        gender: Option<Gender>,

        /// Write an HTML results page here
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Show progress history and generation statistics
    Stats {
        /// Rows per table
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("facename=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Generate { count, age, gender } => {
            commands::generate::execute(config, count, age, gender).await
        }
        Commands::Random { count, age, gender } => {
            commands::random::execute(config, count, age, gender).await
        }
        Commands::Show { id } => commands::show::execute(config, id),
        Commands::Query { query } => commands::query::execute(config, query).await,
        Commands::Batch {
            count,
            age,
            gender,
            html,
        } => commands::batch::execute(config, count, age, gender, html).await,
        Commands::Train {
            count,
            display_time,
            course,
            questions,
            age,
            gender,
            html,
        } => {
            let options = commands::train::TrainOptions {
                count,
                display_time,
                course,
                questions,
                age,
                gender,
                html,
            };
            commands::train::execute(config, options).await
        }
        Commands::Stats { limit } => commands::stats::execute(config, limit),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

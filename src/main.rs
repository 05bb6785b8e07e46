use clap::{Parser as ClapParser, Subcommand};
use sift_ql::cli::{self, RunOptions};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "siftql")]
#[command(about = "sift-ql - filter, sort, paginate, and aggregate flat business records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a query against a JSON record collection
    Run {
        /// The query to execute, e.g. "WHERE risk.equals(Low) LIMIT 10"
        query: String,

        /// JSON file holding an array of flat records (reads from stdin if
        /// not provided)
        #[arg(short, long)]
        data: Option<String>,

        /// Schema file with field kinds, aliases, and label tables
        /// (inferred from the data if not provided)
        #[arg(long)]
        schema: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate query syntax without executing it
    Check {
        /// The query to validate
        query: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            query,
            data,
            schema,
            pretty,
        } => cli::execute_run(&RunOptions {
            query,
            data,
            schema,
            pretty,
        })
        .map(Some),
        Commands::Check { query } => cli::execute_check(&query).map(|()| None),
    };

    match result {
        Ok(Some(rendered)) => println!("{rendered}"),
        Ok(None) => println!("OK"),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

//! CLI command definitions and parsing
use crate::filtering::SortKey;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(
    name = "careseek",
    version,
    about = "Find, rank and filter specialists for a clinical description",
    long_about = "careseek asks a recommendation service for a clinical assessment, searches a provider \
                  directory, ranks the results and keeps the ranked, filterable list between runs."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/careseek/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration profile to apply
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for providers and show the first page
    Search {
        /// Two-letter state code
        #[arg(long)]
        state: String,

        #[arg(long)]
        city: String,

        /// Symptoms or diagnosis in free text
        #[arg(short, long)]
        description: String,

        /// Specialty or taxonomy code to narrow the directory
        #[arg(long)]
        specialty: Option<String>,

        /// Search radius in miles
        #[arg(long)]
        radius: Option<u32>,

        /// Only fetch the clinical assessment
        #[arg(long)]
        assessment_only: bool,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current page of results
    Show {
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change the filter, sort or page size
    Filter {
        /// Search term matched against name, specialty, city and address
        #[arg(short, long)]
        term: Option<String>,

        #[arg(long, value_enum)]
        board_certified: Option<Requirement>,

        /// Accepting new patients
        #[arg(long, value_enum)]
        accepting: Option<Requirement>,

        /// Toggle a language (repeatable)
        #[arg(long)]
        language: Vec<String>,

        /// Toggle an insurance plan (repeatable)
        #[arg(long)]
        insurance: Vec<String>,

        /// Toggle a specialty (repeatable)
        #[arg(long)]
        specialty: Vec<String>,

        /// relevance, rating, experience or name
        #[arg(short, long)]
        sort: Option<SortKey>,

        #[arg(long)]
        page_size: Option<usize>,

        /// Reset every filter before applying the others
        #[arg(long)]
        clear: bool,
    },

    /// Move between pages: next, prev or a page number
    Page {
        target: PageTarget,
    },

    /// Show the clinical assessment for the current results
    Assessment,

    /// Show supplemental links for a provider
    Links {
        /// Provider display name
        name: String,
    },

    /// Fetch specialists after an assessment-only search
    Specialists,

    /// Forget the saved results
    Reset,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Three-way facet requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Requirement {
    Any,
    Yes,
    No,
}

impl Requirement {
    pub fn as_filter(self) -> Option<bool> {
        match self {
            Requirement::Any => None,
            Requirement::Yes => Some(true),
            Requirement::No => Some(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
    Next,
    Previous,
    Number(usize),
}

impl FromStr for PageTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "next" | "n" => Ok(PageTarget::Next),
            "prev" | "previous" | "p" => Ok(PageTarget::Previous),
            other => other
                .parse()
                .map(PageTarget::Number)
                .map_err(|_| format!("expected next, prev or a page number, got '{}'", s)),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Show only a specific section
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

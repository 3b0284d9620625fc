use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Turn a product requirements document into a traceable React project"
)]
pub struct Cli {
    /// Path to the session file (defaults to $PRDGEN_FILE or prdgen.yaml)
    #[clap(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Path to a pipeline config file
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[clap(long, short = 'v')]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract requirements from a document, replacing the current session
    Analyze {
        /// Plain-text document to analyze
        #[clap(required_unless_present = "stdin")]
        doc: Option<PathBuf>,

        /// Read the document from standard input
        #[clap(long, conflicts_with = "doc")]
        stdin: bool,
    },

    /// List requirements
    List {
        /// Filter by category
        #[clap(long)]
        category: Option<String>,

        /// Filter by priority
        #[clap(long)]
        priority: Option<String>,

        /// Filter by status
        #[clap(long)]
        status: Option<String>,
    },

    /// Add a requirement by hand
    Add {
        /// Category (functional, ui, data, performance, security, custom)
        #[clap(long)]
        category: Option<String>,

        /// Priority (high, medium, low)
        #[clap(long)]
        priority: Option<String>,

        /// Requirement text
        #[clap(long)]
        description: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long, short = 'i')]
        interactive: bool,
    },

    /// Edit a requirement; prompts when no field is given
    Edit {
        /// ID of the requirement
        id: String,

        #[clap(long)]
        category: Option<String>,

        #[clap(long)]
        priority: Option<String>,

        #[clap(long)]
        description: Option<String>,

        /// Status (pending, analyzed, implemented, tested)
        #[clap(long)]
        status: Option<String>,
    },

    /// Delete a requirement
    Del {
        /// ID of the requirement
        id: String,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Show or override application metadata
    Meta {
        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        description: Option<String>,

        /// Comma-separated technology list
        #[clap(long)]
        tech: Option<String>,
    },

    /// Run one generation pass
    Generate,

    /// Show requirement coverage of the current artifacts
    Coverage,

    /// List generated artifacts
    Artifacts {
        /// Print the source of one artifact
        #[clap(long)]
        show: Option<String>,

        /// With --show, print the companion test instead
        #[clap(long, requires = "show")]
        test: bool,
    },

    /// Export the project tree or the raw session
    Export {
        /// Directory to write the project into
        #[clap(long, required_unless_present = "json")]
        out: Option<PathBuf>,

        /// Write the session as JSON to this file
        #[clap(long)]
        json: Option<PathBuf>,
    },

    /// Clear the session
    Reset {
        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

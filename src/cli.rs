use azd::config::{NestingPolicy, Preset};
use azd::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface for the azd directive compiler
#[derive(Parser)]
#[command(
    name = "azd",
    about = "Checks and compiles @allows/@denies authorization directives in templates",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Files or directories to check (when no subcommand is used)
    #[arg(help = "Files or directories to check ('-' reads standard input)")]
    pub files: Vec<PathBuf>,

    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "human", global = true, help = "Output format")]
    pub format: OutputFormat,

    /// Output dialect
    #[arg(long, value_enum, global = true, help = "Output dialect (overrides configuration)")]
    pub dialect: Option<Preset>,

    /// Nesting policy
    #[arg(long, value_enum, global = true, help = "Same-type nesting policy (overrides configuration)")]
    pub nesting: Option<NestingPolicy>,

    /// Override dialect templates (format: field=value)
    #[arg(long, global = true, help = "Override a dialect template (format: field=value)")]
    pub set: Vec<String>,

    /// Show only errors (no warnings)
    #[arg(long, global = true, help = "Show only errors, suppress warnings")]
    pub errors_only: bool,

    /// Show configuration and exit
    #[arg(long, help = "Show effective configuration and exit")]
    pub show_config: bool,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Compile templates to the host syntax
    Compile {
        /// Files or directories to compile ('-' reads standard input)
        files: Vec<PathBuf>,
        /// Write compiled files under this directory instead of printing them
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Show what would be written without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// List diagnostic codes
    Codes,
}

impl Cli {
    /// Parse dialect template overrides
    pub fn get_overrides(&self) -> Vec<(String, String)> {
        self.set
            .iter()
            .filter_map(|s| {
                let (field, value) = s.split_once('=')?;
                let field = field.trim();
                if field.is_empty() {
                    None
                } else {
                    Some((field.to_string(), value.to_string()))
                }
            })
            .collect()
    }

    /// Get files to process, defaulting to current directory if none specified
    pub fn get_files(&self) -> Vec<PathBuf> {
        let files = match &self.command {
            Some(Commands::Compile { files, .. }) => files,
            _ => &self.files,
        };

        if files.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            files.clone()
        }
    }
}

// Provide a default implementation for testing
impl Default for Cli {
    fn default() -> Self {
        Self {
            command: None,
            files: Vec::new(),
            config: None,
            format: OutputFormat::default(),
            dialect: None,
            nesting: None,
            set: Vec::new(),
            errors_only: false,
            show_config: false,
            verbose: false,
        }
    }
}

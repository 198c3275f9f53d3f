use clap::{Parser, Subcommand};

/// Edits YAML documents by path, keeping comments and formatting
#[derive(Parser)]
#[command(author, about, long_about=None, disable_version_flag(true))]
pub struct Args {
    /// force color mode (defaults to check tty)
    #[arg(long)]
    pub color: bool,

    /// force no-color mode (defaults to check tty)
    #[arg(long)]
    pub no_color: bool,

    /// display version and quit
    #[arg(short = 'V', long = "version")]
    pub version: bool,

    /// prepend time to each log line
    #[arg(long)]
    pub log_time: bool,

    /// Turn general verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configure component wise logging (COMPONENT=LEVEL)
    #[arg(long, short, action = clap::ArgAction::Append)]
    pub log: Option<Vec<String>>,

    /// quiet path errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Interpret values as YAML instead of literal strings
    #[arg(short = 'y', long, global = true)]
    pub yaml: bool,

    /// Read the document from FILE instead of stdin
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<String>,

    /// Write changes back to FILE instead of printing them
    #[arg(short = 'i', long)]
    pub in_place: bool,

    #[command(subcommand)]
    pub action: Option<Actions>,
}

#[derive(Subcommand)]
pub enum Actions {
    GetValue {
        /// Get node value from given path

        /// The path to get value of
        #[clap(name = "PATH")]
        path: Option<String>,

        /// Default
        #[clap(name = "DEFAULT")]
        default: Option<String>,
    },
    GetType {
        /// Get node type from given path

        /// The path to get type of
        #[clap(name = "PATH")]
        path: Option<String>,
    },
    GetLength {
        /// Get node length from given path

        /// The path to get length of
        #[clap(name = "PATH")]
        path: Option<String>,
    },
    Keys {
        /// Get keys of mapping from given path

        /// The path to get keys from
        #[clap(name = "PATH")]
        path: Option<String>,

        /// Separate items with NUL characters
        #[arg(short = '0')]
        nul: bool,
    },
    Values {
        /// Get values of mapping from given path

        /// The path to get values from
        #[clap(name = "PATH")]
        path: Option<String>,

        /// Separate items with NUL characters
        #[arg(short = '0')]
        nul: bool,
    },
    KeyValues {
        /// Get key and values of mapping from given path

        /// The path to get keys and values from
        #[clap(name = "PATH")]
        path: Option<String>,

        /// Separate items with NUL characters
        #[arg(short = '0')]
        nul: bool,
    },
    SetValue {
        /// Set a value at a given path

        /// The path where to set the value
        #[clap(name = "KEY")]
        key: String,

        /// The value to set
        #[clap(name = "VALUE")]
        value: String,
    },
    Del {
        /// Delete the key or sequence item at a given path

        /// The path to delete
        #[clap(name = "KEY")]
        key: String,
    },
    Append {
        /// Append a value to the sequence at a given path

        /// The path of the sequence, created when missing
        #[clap(name = "PATH")]
        path: String,

        /// The value to append
        #[clap(name = "VALUE")]
        value: String,
    },
    Insert {
        /// Insert a value into the sequence at a given path

        /// The path of the sequence
        #[clap(name = "PATH")]
        path: String,

        /// Position to insert at (0 to length)
        #[arg(name = "INDEX", allow_negative_numbers = true)]
        index: i64,

        /// The value to insert
        #[clap(name = "VALUE")]
        value: String,
    },
    Remove {
        /// Remove an item from the sequence at a given path

        /// The path of the sequence
        #[clap(name = "PATH")]
        path: String,

        /// Position of the item to remove
        #[arg(name = "INDEX", allow_negative_numbers = true)]
        index: i64,
    },
    Update {
        /// Replace an item of the sequence at a given path

        /// The path of the sequence
        #[clap(name = "PATH")]
        path: String,

        /// Position of the item to replace
        #[arg(name = "INDEX", allow_negative_numbers = true)]
        index: i64,

        /// The new value
        #[clap(name = "VALUE")]
        value: String,
    },
    GetAll {
        /// Get every value matching a wildcard pattern

        /// Pattern using `*`, `**` and `[*]`
        #[clap(name = "PATTERN")]
        pattern: String,
    },
    GetKeys {
        /// Get the sorted paths matching a wildcard pattern

        /// Pattern using `*`, `**` and `[*]`
        #[clap(name = "PATTERN")]
        pattern: String,
    },
    SetAll {
        /// Set every value matching a wildcard pattern

        /// Pattern using `*`, `**` and `[*]`
        #[clap(name = "PATTERN")]
        pattern: String,

        /// The value to set
        #[clap(name = "VALUE")]
        value: String,
    },
    Apply {
        /// Merge overlay YAML file(s) into the document

        /// Merge below this path instead of at the root
        #[arg(long = "at", value_name = "PATH")]
        at: Option<String>,

        /// Overlay file(s) to apply
        #[clap(name = "OVERLAY", required = true)]
        overlays: Vec<String>,
    },
    Validate {
        /// Validate the document against a schema file

        /// Schema file
        #[clap(name = "SCHEMA")]
        schema: String,
    },
}

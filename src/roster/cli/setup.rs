use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Which kind of record a fixture holds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    #[default]
    Accounts,
    Activity,
}

#[derive(Parser, Debug)]
#[command(name = "roster", bin_name = "roster", version)]
#[command(about = "Search and page through account and activity records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to roster.toml in the config directory)
    #[arg(short, long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Enable an integration (telegram, discord, matrix, referrals, or all)
    #[arg(long = "capability", global = true, value_name = "NAME", help_heading = "Options")]
    pub capabilities: Vec<String>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load records from a JSON file and run a search over them
    #[command(alias = "s", display_order = 1)]
    Search(SearchArgs),

    /// List the fields that can be filtered on
    #[command(display_order = 2)]
    Fields {
        #[arg(long, value_enum, default_value_t)]
        kind: Kind,
    },

    /// Show how a query is tokenized and parsed
    #[command(display_order = 3)]
    Explain {
        /// Query words (joined with spaces)
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[arg(long, value_enum, default_value_t)]
        kind: Kind,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// JSON file holding an array of records, or a saved page response
    pub file: PathBuf,

    /// Query words (joined with spaces)
    #[arg(num_args = 0..)]
    pub query: Vec<String>,

    #[arg(long, value_enum, default_value_t)]
    pub kind: Kind,

    /// Hand the search to the backend instead of filtering locally
    #[arg(long)]
    pub server: bool,

    /// Column to sort by
    #[arg(long, value_name = "FIELD")]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Load every page before printing
    #[arg(long)]
    pub all: bool,

    /// Terminal rows available for the list (defaults to the page size)
    #[arg(long, value_name = "N")]
    pub rows: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_collects_query_words() {
        let cli = Cli::parse_from([
            "roster",
            "search",
            "users.json",
            "admin:true",
            "bob",
            "--server",
            "--capability",
            "telegram",
        ]);
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.query, vec!["admin:true", "bob"]);
        assert!(args.server);
        assert_eq!(args.kind, Kind::Accounts);
        assert_eq!(cli.capabilities, vec!["telegram"]);
    }

    #[test]
    fn kind_is_selectable() {
        let cli = Cli::parse_from(["roster", "fields", "--kind", "activity"]);
        assert!(matches!(
            cli.command,
            Commands::Fields {
                kind: Kind::Activity
            }
        ));
    }

    #[test]
    fn explain_requires_a_query() {
        assert!(Cli::try_parse_from(["roster", "explain"]).is_err());
    }
}

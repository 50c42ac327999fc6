//! # CLI Layer
//!
//! The terminal client for the roster engine. It is the **only** place that
//! knows about stdout, stderr and exit codes; everything else goes through
//! [`roster::api::ListSession`].
//!
//! Records come from JSON fixtures served by a
//! [`roster::source::MemorySource`], which answers page requests the way the
//! accounts and activity endpoints do. That makes every list behaviour
//! (keep-searching, server search, load-all) observable from the shell.
//!
//! ## Structure
//!
//! - `run()`: parses arguments, installs logging, loads configuration, dispatches
//! - `handle_*()`: one handler per subcommand
//! - `print_*()` (in `print.rs`): output formatting

use super::print::{
    print_capabilities, print_chips, print_counter, print_filter_options, print_not_found,
    print_predicates, print_rows, print_terms, print_tokens, print_warning, RowDisplay,
};
use super::setup::{Cli, Commands, Kind, SearchArgs};
use anyhow::{bail, Context, Result};
use clap::Parser;
use roster::accounts::{self, Account};
use roster::activity::{self, Activity};
use roster::api::{build_list, ListSession};
use roster::config::ListConfig;
use roster::fields::FieldRegistry;
use roster::list::ListEvent;
use roster::model::Item;
use roster::query::{parse_tokens, tokenize_spanned};
use roster::render::Viewport;
use roster::source::{load_items, MemorySource};
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const ALL_CAPABILITIES: &str = "all";

/// What the CLI needs to know about a record kind.
trait Listing: Item + RowDisplay + DeserializeOwned + Clone + 'static {
    const COLUMNS: &'static [&'static str];
    /// Column and direction used when `--sort` is not given.
    const DEFAULT_SORT: (&'static str, bool);

    fn registry() -> FieldRegistry<Self>;
}

impl Listing for Account {
    const COLUMNS: &'static [&'static str] = accounts::SORT_COLUMNS;
    const DEFAULT_SORT: (&'static str, bool) = (accounts::DEFAULT_SORT_FIELD, true);

    fn registry() -> FieldRegistry<Self> {
        accounts::registry()
    }
}

impl Listing for Activity {
    const COLUMNS: &'static [&'static str] = activity::SORT_COLUMNS;
    const DEFAULT_SORT: (&'static str, bool) = (activity::DEFAULT_SORT_FIELD, false);

    fn registry() -> FieldRegistry<Self> {
        activity::registry()
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = ListConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.capabilities.extend(cli.capabilities.iter().cloned());
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Search(args) => match args.kind {
            Kind::Accounts => handle_search::<Account>(&config, args),
            Kind::Activity => handle_search::<Activity>(&config, args),
        },
        Commands::Fields { kind } => match kind {
            Kind::Accounts => handle_fields::<Account>(&config),
            Kind::Activity => handle_fields::<Activity>(&config),
        },
        Commands::Explain { query, kind } => match kind {
            Kind::Accounts => handle_explain::<Account>(&config, &query.join(" ")),
            Kind::Activity => handle_explain::<Activity>(&config, &query.join(" ")),
        },
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("roster=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// The registry the client searches with: configured capabilities only, or
/// everything when `all` was asked for.
fn client_registry<T: Listing>(config: &ListConfig) -> FieldRegistry<T> {
    let registry = T::registry();
    if config.capabilities.iter().any(|c| c == ALL_CAPABILITIES) {
        registry.enable_all()
    } else {
        registry
    }
}

fn client_config(config: &ListConfig) -> ListConfig {
    let mut config = config.clone();
    config.capabilities.retain(|c| c != ALL_CAPABILITIES);
    config
}

fn handle_search<T: Listing>(config: &ListConfig, args: SearchArgs) -> Result<()> {
    let items: Vec<T> = load_items(&args.file)
        .with_context(|| format!("reading records from {}", args.file.display()))?;
    debug!(count = items.len(), "fixture loaded");

    // The backend knows every field regardless of what the client enabled.
    let source = MemorySource::new(items, T::registry().enable_all());
    let rows = args.rows.unwrap_or(config.page_size).max(1);
    let list = build_list(
        client_registry::<T>(config),
        T::COLUMNS,
        &client_config(config),
        Viewport::rows(rows),
    );
    let mut session = ListSession::new(list, source, Vec::new());

    let (column, ascending) = match &args.sort {
        Some(column) => (column.as_str(), !args.desc),
        None => (T::DEFAULT_SORT.0, T::DEFAULT_SORT.1 && !args.desc),
    };
    if !session.set_sort(column, ascending) {
        bail!(
            "cannot sort by '{}' (available: {})",
            column,
            T::COLUMNS.join(", ")
        );
    }

    session.open();
    if !args.query.is_empty() {
        let text = args.query.join(" ");
        if args.server {
            session.submit_query(&text);
        } else {
            session.search(&text);
        }
    }
    if args.all {
        session.load_all();
    }

    let list = session.list();
    for event in session.view() {
        if let ListEvent::LoadFailed(message) = event {
            print_warning(message);
        }
    }

    let not_found = session
        .view()
        .iter()
        .rev()
        .find_map(|event| match event {
            ListEvent::NotFound(state) => Some(*state),
            _ => None,
        })
        .unwrap_or(false);

    let rows: Vec<&T> = list
        .render()
        .materialized_keys()
        .iter()
        .filter_map(|key| list.store().get(key))
        .collect();
    if not_found || rows.is_empty() {
        print_not_found();
    } else {
        print_rows(&rows);
    }
    print_chips(&list.search().chips());
    print_counter(list.counter());
    Ok(())
}

fn handle_fields<T: Listing>(config: &ListConfig) -> Result<()> {
    let mut registry = client_registry::<T>(config);
    for capability in &client_config(config).capabilities {
        registry.set_capability(capability, true);
    }
    print_filter_options(&registry.filter_options());

    let capabilities: Vec<(&'static str, bool)> = registry
        .capabilities()
        .into_iter()
        .map(|c| (c, registry.capability_enabled(c)))
        .collect();
    print_capabilities(&capabilities);
    Ok(())
}

fn handle_explain<T: Listing>(config: &ListConfig, text: &str) -> Result<()> {
    let mut registry = client_registry::<T>(config);
    for capability in &client_config(config).capabilities {
        registry.set_capability(capability, true);
    }

    let tokens = tokenize_spanned(text);
    let parsed = parse_tokens(&tokens, &registry, &config.parse_context());

    print_tokens(&tokens);
    print_terms(&parsed.terms);
    let predicates: Vec<_> = parsed
        .queries
        .iter()
        .map(|q| (q.chip().clone(), q.is_local_only()))
        .collect();
    print_predicates(&predicates);

    let descriptors: Vec<_> = parsed.queries.iter().filter_map(|q| q.as_dto()).collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&descriptors).context("encoding descriptors")?
    );
    Ok(())
}

//! d1port CLI
//!
//! Command-line tool for turning legacy JSON exports into an import script.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use d1port::prelude::*;
use d1port::profile;

/// Legacy JSON exports to a D1/SQLite import script.
#[derive(Parser)]
#[command(name = "d1port")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the import script.
    Generate {
        /// Directory holding the per-table exports.
        #[arg(short, long, env = "D1PORT_INPUT_DIR", default_value = ".")]
        input_dir: PathBuf,

        /// Export file name template; `{table}` is replaced by the table name.
        #[arg(short, long, default_value = "{table}_raw.json")]
        naming: String,

        /// Output file (stdout if not specified).
        #[arg(short, long, env = "D1PORT_OUTPUT")]
        output: Option<PathBuf>,

        /// Leave the generation date out of the header.
        #[arg(long)]
        no_header_date: bool,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Show the resolved table order, mappings and rules.
    Plan {
        /// Print the plan as JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Args)]
struct PolicyArgs {
    /// Statement form used for every INSERT.
    #[arg(long, value_enum, default_value_t = OnConflict::Ignore)]
    on_conflict: OnConflict,

    /// What happens to locale codes outside the remap table.
    #[arg(long, value_enum, default_value_t = LocaleFallback::Passthrough)]
    locale_fallback: LocaleFallback,

    /// Where each table's column list comes from.
    #[arg(long, value_enum, default_value_t = Layout::Inferred)]
    layout: Layout,

    /// Do not double backslashes in text literals.
    #[arg(long)]
    keep_backslashes: bool,

    /// Delete the seeded placeholder admin (users.id = 1) before importing.
    #[arg(long)]
    drop_seed_admin: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnConflict {
    Ignore,
    Replace,
    Strict,
}

impl From<OnConflict> for ConflictPolicy {
    fn from(value: OnConflict) -> Self {
        match value {
            OnConflict::Ignore => Self::Ignore,
            OnConflict::Replace => Self::Replace,
            OnConflict::Strict => Self::Strict,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LocaleFallback {
    Passthrough,
    En,
}

impl From<LocaleFallback> for LocalePolicy {
    fn from(value: LocaleFallback) -> Self {
        match value {
            LocaleFallback::Passthrough => Self::Passthrough,
            LocaleFallback::En => Self::english(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    Inferred,
    Asserted,
}

impl From<Layout> for ColumnLayout {
    fn from(value: Layout) -> Self {
        match value {
            Layout::Inferred => Self::Inferred,
            Layout::Asserted => Self::Asserted,
        }
    }
}

impl PolicyArgs {
    fn apply(&self, builder: MigrationConfigBuilder) -> MigrationConfigBuilder {
        let style = if self.keep_backslashes {
            LiteralStyle::new().keep_backslashes()
        } else {
            LiteralStyle::new()
        };
        let builder = builder
            .conflict_policy(self.on_conflict.into())
            .locale_policy(self.locale_fallback.into())
            .layout(self.layout.into())
            .literal_style(style);
        if self.drop_seed_admin {
            builder.pre_statement(profile::SEED_ADMIN_CLEANUP)
        } else {
            builder
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays plain SQL
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Generate {
            input_dir,
            naming,
            output,
            no_header_date,
            policy,
        } => {
            let generated_at = (!no_header_date).then(Utc::now);
            let config = policy
                .apply(profile::legacy_d1())
                .generated_at(generated_at)
                .build()?;
            let source = DirectorySource::new(&input_dir, ExportNaming::new(naming)?);

            info!(
                naming = %source.naming().template(),
                "Reading exports from {}",
                source.dir().display()
            );

            let out: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path)
                        .with_context(|| format!("cannot create {}", path.display()))?,
                )),
                None => Box::new(io::stdout().lock()),
            };
            let summary = Pipeline::new(&config, &source, SqliteDialect::new()).run(out)?;

            for report in summary.skipped() {
                if let TableOutcome::Skipped { detail, .. } = &report.outcome {
                    info!("  skipped {}: {}", report.table, detail);
                }
            }
            if let Some(path) = &output {
                info!(
                    "Wrote {} rows from {} tables to {}",
                    summary.total_rows(),
                    summary.imported().count(),
                    path.display()
                );
            }
        }

        Commands::Plan { json, policy } => {
            let config = policy.apply(profile::legacy_d1()).build()?;
            let report = PlanReport::new(&config);
            let mut stdout = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut stdout, &report)?;
                writeln!(stdout)?;
            } else {
                write!(stdout, "{report}")?;
            }
        }
    }

    Ok(())
}

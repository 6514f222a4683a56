use anyhow::Result;
use chisel::CommitDisplayFormat;
use chisel::areas::repository::Repository;
use chisel::artifacts::core::PagerWriter;
use chisel::artifacts::log::filter::{CommitFilter, DateColumn};
use chisel::artifacts::objects::commit::{Actor, parse_date, parse_utc_offset};
use chisel::artifacts::timelapse::domain::{HourWindow, TimeDomain, Weekdays};
use chisel::commands::porcelain::edit::EditOptions;
use chisel::commands::porcelain::log::LogOptions;
use chisel::commands::porcelain::reorder::ReorderOptions;
use chisel::commands::porcelain::write::WriteOptions;
use chisel::config::RewriteSettings;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use is_terminal::IsTerminal;
use minus::Pager;
use regex::Regex;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "chisel",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Edit commit metadata and rewrite branch history",
    long_about = "Stage author, committer, date and message edits against a branch's history, \
    then rewrite the branch from the oldest modified commit in a single git filter-branch run.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[arg(
        short = 'C',
        global = true,
        value_name = "PATH",
        help = "Run as if started in PATH"
    )]
    directory: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "log",
        about = "Show the history of a branch",
        long_about = "This command shows the commits of a branch, newest first, marking those not yet pushed to the upstream."
    )]
    Log {
        #[arg(short, long, help = "The branch to show (defaults to the checked-out one)")]
        branch: Option<String>,
        #[arg(long, help = "Show each commit on a single line")]
        oneline: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },
    #[command(name = "branches", about = "List local branches")]
    Branches,
    #[command(
        name = "edit",
        about = "Edit the metadata of commits and rewrite the branch",
        long_about = "This command stages new values for the selected commits and rewrites the branch \
        starting from the oldest modified commit. Commits are selected by revision, by filter, or both."
    )]
    Edit {
        #[arg(index = 1, help = "Commits to edit")]
        revisions: Vec<String>,
        #[arg(short, long, help = "The branch to rewrite (defaults to the checked-out one)")]
        branch: Option<String>,
        #[arg(long, help = "Select every commit matching the filters (all commits without filters)")]
        all: bool,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_parser = parse_actor, help = "New author, as \"Name <email>\"")]
        author: Option<Actor>,
        #[arg(long, value_parser = parse_actor, help = "New committer, as \"Name <email>\"")]
        committer: Option<Actor>,
        #[arg(long, value_parser = parse_date, help = "New authored date")]
        author_date: Option<DateTime<FixedOffset>>,
        #[arg(long, value_parser = parse_date, help = "New committed date")]
        commit_date: Option<DateTime<FixedOffset>>,
        #[arg(short, long, help = "New commit message")]
        message: Option<String>,
        #[arg(long, help = "Keep author and committer (and their dates) identical")]
        merge: bool,
        #[command(flatten)]
        write: WriteArgs,
    },
    #[command(
        name = "reorder",
        about = "Redistribute commit dates over a time domain",
        long_about = "This command draws new dates for every commit of the branches within the allowed \
        days, weekdays and hours, keeping the commits' order, and rewrites the branches."
    )]
    Reorder {
        #[arg(short, long = "branch", help = "Branches to reorder (defaults to the checked-out one)")]
        branches: Vec<String>,
        #[arg(long, value_parser = parse_day, help = "First allowed day, YYYY-MM-DD")]
        from: NaiveDate,
        #[arg(long, value_parser = parse_day, help = "Day after the last allowed one, YYYY-MM-DD")]
        to: NaiveDate,
        #[arg(long, value_parser = HourWindow::try_parse, help = "Allowed hours, HH:MM-HH:MM (repeatable)")]
        hours: Vec<HourWindow>,
        #[arg(long, value_parser = Weekdays::try_parse, help = "Allowed weekdays, e.g. workdays or mon,wed")]
        weekdays: Option<Weekdays>,
        #[arg(long, value_parser = parse_utc_offset, allow_hyphen_values = true, help = "Offset the hours are given in, e.g. +0200")]
        utc_offset: Option<FixedOffset>,
        #[arg(long, help = "Seed for reproducible dates")]
        seed: Option<u64>,
        #[command(flatten)]
        write: WriteArgs,
    },
}

#[derive(Args, Default)]
struct FilterArgs {
    #[arg(long, value_parser = DateColumn::try_parse, help = "Date the date criteria look at: authored, committed or any")]
    date_column: Option<DateColumn>,
    #[arg(long, value_parser = parse_date, help = "Only commits dated after this date")]
    after: Option<DateTime<FixedOffset>>,
    #[arg(long, value_parser = parse_date, help = "Only commits dated before this date")]
    before: Option<DateTime<FixedOffset>>,
    #[arg(long = "on", value_parser = Weekdays::try_parse, help = "Only commits dated on these weekdays")]
    on_weekdays: Option<Weekdays>,
    #[arg(long, value_parser = parse_time, help = "Only commits dated after this time of day")]
    after_hour: Option<NaiveTime>,
    #[arg(long, value_parser = parse_time, help = "Only commits dated before this time of day")]
    before_hour: Option<NaiveTime>,
    #[arg(long, value_parser = Regex::new, help = "Only commits whose author or committer matches")]
    match_actor: Option<Regex>,
    #[arg(long, value_parser = Regex::new, help = "Only commits whose message matches")]
    match_message: Option<Regex>,
    #[arg(long, help = "Only commits not pushed to the upstream")]
    local_only: bool,
}

impl FilterArgs {
    fn into_filter(self) -> CommitFilter {
        let mut filter = CommitFilter::new()
            .date_column(self.date_column.unwrap_or_default())
            .local_only(self.local_only);
        if let Some(after) = self.after {
            filter = filter.after(after);
        }
        if let Some(before) = self.before {
            filter = filter.before(before);
        }
        if let Some(weekdays) = self.on_weekdays {
            filter = filter.on_weekdays(weekdays);
        }
        if let Some(time) = self.after_hour {
            filter = filter.after_hour(time);
        }
        if let Some(time) = self.before_hour {
            filter = filter.before_hour(time);
        }
        if let Some(pattern) = self.match_actor {
            filter = filter.actor_matching(pattern);
        }
        if let Some(pattern) = self.match_message {
            filter = filter.message_matching(pattern);
        }
        filter
    }
}

#[derive(Args)]
struct WriteArgs {
    #[arg(long, help = "Append the rewrite command and its output to chisel.log")]
    log: bool,
    #[arg(long, help = "Write a standalone script replaying the rewrite")]
    replay_script: bool,
    #[arg(long, help = "Print the filters and the command line without rewriting")]
    dry_run: bool,
    #[arg(long, value_name = "COMMITS", help = "Show progress above this many rewritten commits")]
    progress_threshold: Option<usize>,
}

impl WriteArgs {
    fn into_options(self) -> WriteOptions {
        let mut settings = RewriteSettings::default();
        if let Some(threshold) = self.progress_threshold {
            settings = settings.with_progress_threshold(threshold);
        }

        WriteOptions {
            log: self.log,
            replay_script: self.replay_script,
            dry_run: self.dry_run,
            settings,
        }
    }
}

fn parse_actor(value: &str) -> Result<Actor> {
    Actor::try_from(value)
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value, "%Y-%m-%d")?)
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| anyhow::anyhow!("invalid time of day: {value:?}"))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn use_pager() -> bool {
    std::env::var_os("NO_PAGER").is_none() && std::io::stdout().is_terminal()
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let directory = match cli.directory {
        Some(directory) => directory,
        None => std::env::current_dir()?,
    };
    let directory = directory.to_string_lossy().into_owned();

    match cli.command {
        Commands::Log {
            branch,
            oneline,
            filter,
        } => {
            let opts = LogOptions {
                branch,
                format: if oneline {
                    CommitDisplayFormat::OneLine
                } else {
                    CommitDisplayFormat::Medium
                },
                filter: filter.into_filter(),
            };

            if use_pager() {
                let pager = Pager::new();
                let repository =
                    Repository::new(&directory, Box::new(PagerWriter::new(pager.clone())))?;
                repository.log(&opts)?;
                minus::page_all(pager)?;
            } else {
                let repository = Repository::new(&directory, Box::new(std::io::stdout()))?;
                repository.log(&opts)?;
            }
        }
        Commands::Branches => {
            let repository = Repository::new(&directory, Box::new(std::io::stdout()))?;
            repository.branches()?;
        }
        Commands::Edit {
            revisions,
            branch,
            all,
            filter,
            author,
            committer,
            author_date,
            commit_date,
            message,
            merge,
            write,
        } => {
            let filter = filter.into_filter();
            let opts = EditOptions {
                branch,
                revisions,
                filter: (all || !filter.is_empty()).then_some(filter),
                author,
                committer,
                author_date,
                commit_date,
                message,
                merge,
                write: write.into_options(),
            };

            let repository = Repository::new(&directory, Box::new(std::io::stdout()))?;
            repository.edit(&opts).await?;
        }
        Commands::Reorder {
            branches,
            from,
            to,
            hours,
            weekdays,
            utc_offset,
            seed,
            write,
        } => {
            let mut domain = TimeDomain::new(from, to);
            if !hours.is_empty() {
                domain = domain.with_hours(hours);
            }
            if let Some(weekdays) = weekdays {
                domain = domain.with_weekdays(weekdays);
            }
            if let Some(offset) = utc_offset {
                domain = domain.with_offset(offset);
            }

            let opts = ReorderOptions {
                branches,
                domain,
                seed,
                write: write.into_options(),
            };

            let repository = Repository::new(&directory, Box::new(std::io::stdout()))?;
            repository.reorder(&opts).await?;
        }
    }

    Ok(())
}

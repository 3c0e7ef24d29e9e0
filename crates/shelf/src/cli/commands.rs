use super::logging;
use super::render::{
    format_files, format_job_result, format_progress, format_shares, format_trash, format_usage,
    print_json, print_outcome,
};
use super::setup::{Cli, Commands, ShareCommands, TrashCommands};
use clap::Parser;
use shelfapp::archive::{ArchiveFormat, JobId, JobStatus};
use shelfapp::commands::BatchOutcome;
use shelfapp::commands::share::Download;
use shelfapp::commands::files::Transfer;
use shelfapp::config::{ShelfConfig, default_dirs};
use shelfapp::{Result, ShelfApi, ShelfError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How a successful run should end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// A batch ran but some items failed.
    Partial,
}

impl Outcome {
    fn of(batch: &BatchOutcome) -> Self {
        if batch.is_clean() {
            Outcome::Done
        } else {
            Outcome::Partial
        }
    }
}

struct AppContext {
    api: ShelfApi,
    config: ShelfConfig,
    config_dir: PathBuf,
    json: bool,
}

pub fn run() -> Result<Outcome> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let format_override = match &cli.command {
        Commands::Archive {
            format: Some(format),
            ..
        } => Some((*format).into()),
        _ => None,
    };
    let ctx = init_context(&cli, format_override)?;

    match cli.command {
        Commands::Ls { path } => {
            let entries = ctx.api.list_dir(&path)?;
            if ctx.json {
                print_json(&entries)?;
            } else {
                println!("{}", format_files(&entries));
            }
        }
        Commands::Find { category } => {
            let entries = ctx.api.list_category(category.into());
            if ctx.json {
                print_json(&entries)?;
            } else {
                println!("{}", format_files(&entries));
            }
        }
        Commands::Mkdir { name, parent } => {
            let rel = ctx.api.mkdir(&parent, &name)?;
            println!("Created {}", rel);
        }
        Commands::Rename { path, new_name } => {
            let rel = ctx.api.rename(&path, &new_name)?;
            println!("Renamed {} -> {}", path, rel);
        }
        Commands::Mv { paths, to } => {
            let outcome = ctx.api.transfer(Transfer::Move, &paths, &to)?;
            return report(&ctx, "moved", &outcome);
        }
        Commands::Cp { paths, to } => {
            let outcome = ctx.api.transfer(Transfer::Copy, &paths, &to)?;
            return report(&ctx, "copied", &outcome);
        }
        Commands::Rm { paths } => {
            let outcome = ctx.api.soft_delete(&paths);
            return report(&ctx, "trashed", &outcome);
        }
        Commands::Trash(cmd) => return handle_trash(&ctx, cmd),
        Commands::Share(cmd) => return handle_share(&ctx, cmd),
        Commands::Put { file, to, name } => {
            let rel = put_local(&ctx, &file, &to, name)?;
            println!("Stored {}", rel);
        }
        Commands::Cat { path } => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            ctx.api.read_file(&path, &mut out)?;
        }
        Commands::Archive { paths, .. } => return handle_archive(&ctx, &paths),
        Commands::Usage => {
            let usage = ctx.api.usage();
            if ctx.json {
                print_json(&usage)?;
            } else {
                println!("{}", format_usage(&usage));
            }
        }
        Commands::Config { save } => {
            print_json(&ctx.config)?;
            if save {
                ctx.config.save(&ctx.config_dir)?;
                eprintln!("Saved {}", ctx.config_dir.join("config.json").display());
            }
        }
    }
    Ok(Outcome::Done)
}

fn init_context(cli: &Cli, format_override: Option<ArchiveFormat>) -> Result<AppContext> {
    let dirs = default_dirs();
    let config_dir = match (&cli.config, &dirs) {
        (Some(dir), _) => dir.clone(),
        (None, Ok(dirs)) => dirs.config_dir.clone(),
        (None, Err(_)) => {
            return Err(ShelfError::Config(
                "No config directory: set SHELF_CONFIG_DIR or pass --config".to_string(),
            ));
        }
    };
    let data_dir = dirs
        .map(|d| d.data_dir)
        .unwrap_or_else(|_| config_dir.clone());

    let mut config = ShelfConfig::load(&config_dir, &data_dir)?.from_env()?;
    if let Some(format) = format_override {
        config.archive.format = format;
    }
    tracing::info!(
        config_dir = %config_dir.display(),
        storage = %config.storage_path.display(),
        "Using configuration"
    );

    let api = ShelfApi::open(&config)?;
    Ok(AppContext {
        api,
        config,
        config_dir,
        json: cli.json,
    })
}

fn report(ctx: &AppContext, verb: &str, outcome: &BatchOutcome) -> Result<Outcome> {
    if ctx.json {
        print_json(outcome)?;
    } else {
        print_outcome(verb, outcome);
    }
    Ok(Outcome::of(outcome))
}

fn handle_trash(ctx: &AppContext, cmd: TrashCommands) -> Result<Outcome> {
    match cmd {
        TrashCommands::List => {
            let entries = ctx.api.trash_list();
            if ctx.json {
                print_json(&entries)?;
            } else {
                println!("{}", format_trash(&entries));
            }
            Ok(Outcome::Done)
        }
        TrashCommands::Restore { ids } => report(ctx, "restored", &ctx.api.restore(&ids)),
        TrashCommands::Purge { ids } => report(ctx, "purged", &ctx.api.purge(&ids)),
        TrashCommands::Empty => report(ctx, "purged", &ctx.api.empty_trash()),
    }
}

fn handle_share(ctx: &AppContext, cmd: ShareCommands) -> Result<Outcome> {
    match cmd {
        ShareCommands::Create { paths } => report(ctx, "shared", &ctx.api.create_shares(&paths)),
        ShareCommands::List => {
            let entries = ctx.api.share_list();
            if ctx.json {
                print_json(&entries)?;
            } else {
                println!("{}", format_shares(&entries));
            }
            Ok(Outcome::Done)
        }
        ShareCommands::Cancel { id } => {
            if ctx.api.cancel_share(&id)? {
                println!("Cancelled {}", id);
                Ok(Outcome::Done)
            } else {
                Err(ShelfError::ShareNotFound(id))
            }
        }
        ShareCommands::Fetch { id, output } => {
            let download = match output {
                Some(path) => fetch_to_file(ctx, &id, &path)?,
                None => {
                    let stdout = io::stdout();
                    let mut out = stdout.lock();
                    ctx.api.download_share(&id, &mut out)?
                }
            };
            eprintln!(
                "{} ({} bytes, {} downloads)",
                download.file_name, download.bytes, download.downloads
            );
            Ok(Outcome::Done)
        }
    }
}

fn fetch_to_file(ctx: &AppContext, id: &str, path: &Path) -> Result<Download> {
    let mut out = BufWriter::new(File::create(path)?);
    match ctx.api.download_share(id, &mut out) {
        Ok(download) => Ok(download),
        Err(e) => {
            drop(out);
            let _ = std::fs::remove_file(path);
            Err(e)
        }
    }
}

fn put_local(ctx: &AppContext, file: &Path, to: &str, name: Option<String>) -> Result<String> {
    let name = match name {
        Some(name) => name,
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ShelfError::InvalidPath(file.display().to_string()))?,
    };
    let mut source = File::open(file)?;
    ctx.api.put_file(to, &name, &mut source)
}

/// Submit and follow the job until it is terminal. The engine lives in
/// this process and is shut down when the command returns.
fn handle_archive(ctx: &AppContext, paths: &[String]) -> Result<Outcome> {
    let id = ctx.api.submit_archive(paths)?;
    let status = follow(ctx, &id)?;
    if ctx.json {
        print_json(&status)?;
    } else {
        println!("{}", format_job_result(&status));
    }
    match status {
        JobStatus::Failure { error } => Err(ShelfError::Store(format!("archive job {} failed: {}", id, error))),
        _ => Ok(Outcome::Done),
    }
}

/// Poll until terminal, printing each new snapshot to stderr.
fn follow(ctx: &AppContext, id: &JobId) -> Result<JobStatus> {
    let mut last: Option<JobStatus> = None;
    let mut stderr = io::stderr();

    loop {
        let status = ctx.api.job_status(id)?;
        if last.as_ref() != Some(&status) {
            if let Some(line) = format_progress(&status) {
                let _ = writeln!(stderr, "{}", line);
            }
            last = Some(status.clone());
        }
        if status.is_terminal() {
            return Ok(status);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

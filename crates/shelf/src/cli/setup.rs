use clap::{Parser, Subcommand, ValueEnum};
use shelfapp::archive::ArchiveFormat;
use shelfapp::commands::files::Category;
use std::path::PathBuf;

/// Version string with git hash and commit date for non-release builds.
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            format!("v{}", VERSION)
        } else {
            format!("v{}\ndev: {} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "shelf",
    bin_name = "shelf",
    version = get_version(),
    about = "Self-hosted file manager: browse, trash, share and archive files under one root",
    long_about = None,
    after_help = "Paths are relative to the storage root (STORAGE_PATH or the config file).\nExit status is 2 when a batch finished with some failed items."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding config.json
    #[arg(long, global = true, env = "SHELF_CONFIG_DIR", value_name = "DIR")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (info-level logs on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a directory
    Ls {
        /// Directory to list, the root when omitted
        #[arg(default_value = "")]
        path: String,
    },

    /// Find every file of a category under the root, newest first
    Find {
        #[arg(value_enum)]
        category: CategoryArg,
    },

    /// Create a directory
    Mkdir {
        name: String,

        /// Parent directory
        #[arg(long = "in", default_value = "", value_name = "DIR")]
        parent: String,
    },

    /// Rename an item in place
    Rename { path: String, new_name: String },

    /// Move items into a directory
    Mv {
        #[arg(required = true)]
        paths: Vec<String>,

        /// Destination directory, the root when omitted
        #[arg(long, default_value = "", value_name = "DIR")]
        to: String,
    },

    /// Copy items into a directory
    Cp {
        #[arg(required = true)]
        paths: Vec<String>,

        /// Destination directory, the root when omitted
        #[arg(long, default_value = "", value_name = "DIR")]
        to: String,
    },

    /// Move items to the trash
    #[command(alias = "delete")]
    Rm {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Inspect and manage the trash
    #[command(subcommand)]
    Trash(TrashCommands),

    /// Manage public share links
    #[command(subcommand)]
    Share(ShareCommands),

    /// Store a local file under the root, creating the directory if needed
    Put {
        /// Local file to import
        file: PathBuf,

        /// Destination directory, the root when omitted
        #[arg(long, default_value = "", value_name = "DIR")]
        to: String,

        /// Name to store it under, the local file name when omitted
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },

    /// Print a file's raw content to stdout
    Cat { path: String },

    /// Build an archive and follow its progress until it is finished
    Archive {
        /// Files and directories to include
        paths: Vec<String>,

        /// Container format, overriding the configured one
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Show disk usage of the storage root
    Usage,

    /// Show the effective configuration
    Config {
        /// Write it to config.json
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TrashCommands {
    /// List trashed items, most recent first
    #[command(alias = "ls")]
    List,

    /// Put items back where they came from
    Restore {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete items permanently
    Purge {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete everything in the trash permanently
    Empty,
}

#[derive(Subcommand, Debug)]
pub enum ShareCommands {
    /// Create share links for existing paths
    Create {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// List shares with their download counts and status
    #[command(alias = "ls")]
    List,

    /// Revoke a share link
    Cancel { id: String },

    /// Download a shared file as an anonymous visitor would
    Fetch {
        id: String,

        /// Write here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum CategoryArg {
    Image,
    Video,
    Doc,
    App,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Image => Category::Image,
            CategoryArg::Video => Category::Video,
            CategoryArg::Doc => Category::Doc,
            CategoryArg::App => Category::App,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum FormatArg {
    Zip,
    #[value(name = "tar.gz", alias = "tgz")]
    TarGz,
}

impl From<FormatArg> for ArchiveFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Zip => ArchiveFormat::Zip,
            FormatArg::TarGz => ArchiveFormat::TarGz,
        }
    }
}

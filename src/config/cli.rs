use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use uuid::Uuid;

use crate::domain::posts::{LayoutMode, SortOrder};

/// Command-line arguments for the narrative binary.
#[derive(Debug, Parser)]
#[command(name = "narrative", version, about = "Story listing and admin tool")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "NARRATIVE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Show the public story listing.
    List(ListArgs),
    /// Show a single published story with its neighbours.
    Show(ShowArgs),
    /// Manage stories and site settings.
    Admin(AdminArgs),
}

/// Settings that may be overridden on any command.
#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the log level (e.g. info, debug).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit structured JSON logs instead of compact text.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Path of the story store document.
    #[arg(long = "store-path", value_name = "PATH", value_hint = ValueHint::FilePath, global = true)]
    pub store_path: Option<PathBuf>,

    /// Directory that uploaded images are written to.
    #[arg(long = "uploads-directory", value_name = "PATH", value_hint = ValueHint::DirPath, global = true)]
    pub uploads_directory: Option<PathBuf>,

    /// Public URL prefix that uploaded images are served from.
    #[arg(long = "uploads-public-base-url", value_name = "URL", global = true)]
    pub uploads_public_base_url: Option<String>,

    /// UTC offset used for calendar dates, e.g. +02:00.
    #[arg(long = "site-utc-offset", value_name = "OFFSET", allow_hyphen_values = true, global = true)]
    pub site_utc_offset: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    /// Case-insensitive text matched against title and content.
    #[arg(long, default_value = "")]
    pub search: String,

    /// `new` for newest first, `old` for oldest first.
    #[arg(long, default_value = "new")]
    pub sort: SortOrder,

    /// `list` or `grid`.
    #[arg(long, default_value = "list")]
    pub layout: LayoutMode,

    /// Print the page as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Story permalink.
    pub slug: String,

    /// Print the page as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AdminArgs {
    /// Admin account email.
    #[arg(long, env = "NARRATIVE_ADMIN_LOGIN_EMAIL", default_value = "")]
    pub email: String,

    /// Admin account password.
    #[arg(long, env = "NARRATIVE_ADMIN_LOGIN_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum AdminCommand {
    /// List every story, drafts included, newest first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Create a story.
    Create(PostFormArgs),
    /// Show a story's form values, or update it when any field is given.
    Edit {
        id: Uuid,
        #[command(flatten)]
        form: PostFormArgs,
    },
    /// Delete a story.
    Delete { id: Uuid },
    /// Show site settings, or update title and author.
    Settings {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Replace the hero image.
    Hero {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
}

#[derive(Debug, Args, Default, Clone)]
pub struct PostFormArgs {
    #[arg(long)]
    pub title: Option<String>,

    /// Calendar date, YYYY-MM-DD.
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read the story body from a file.
    #[arg(long = "content-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,

    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub published: Option<bool>,

    /// Cover image to upload.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub cover: Option<PathBuf>,
}

impl PostFormArgs {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.content.is_none()
            && self.content_file.is_none()
            && self.published.is_none()
            && self.cover.is_none()
    }
}

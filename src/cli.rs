use clap::Parser;
use std::path::PathBuf;

/// Collect posts from messaging channels into a single EPUB
#[derive(Parser, Debug)]
#[command(name = "chanbook", version, about)]
pub struct Cli {
    /// TOML configuration file. Flags given here override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Channel to include, e.g. @durov. Repeat for several channels.
    #[arg(short = 'C', long = "channel")]
    pub channels: Vec<String>,

    /// Take this many most recent posts per channel instead of a date range
    #[arg(short = 'n', long, conflicts_with_all = ["start", "end"])]
    pub posts: Option<usize>,

    /// Oldest post date to include (RFC 3339 or YYYY-MM-DD, UTC)
    #[arg(long)]
    pub start: Option<String>,

    /// Newest post date to include. A bare date covers the whole day.
    #[arg(long)]
    pub end: Option<String>,

    /// Path of the EPUB to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Scratch directory for downloaded images
    #[arg(long)]
    pub images_dir: Option<PathBuf>,

    /// Directory holding one Telegram export per channel
    #[arg(long)]
    pub exports_dir: Option<PathBuf>,

    /// Do not start a new page after every post
    #[arg(long, default_value_t = false)]
    pub no_page_breaks: bool,

    /// Do not extract images (only text content)
    #[arg(long, default_value_t = false)]
    pub no_images: bool,

    /// Keep images in color
    #[arg(long, default_value_t = false)]
    pub no_grayscale: bool,

    /// Book title
    #[arg(long)]
    pub title: Option<String>,

    /// Book language code
    #[arg(long)]
    pub language: Option<String>,

    /// Log every evaluated message
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

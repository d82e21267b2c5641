use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "ilstdev: in-place MP4 metadata patcher", long_about = None)]
pub struct Cli {
    /// Log patch steps (repeat for per-item tracing)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the fields stored in a file's metadata list
    Show {
        file: PathBuf,
        /// Print the fields as JSON
        #[arg(long)]
        json: bool,
    },

    /// Patch fields into a file's metadata list in place
    Set {
        file: PathBuf,

        #[command(flatten)]
        fields: FieldArgs,

        /// Re-read the patched copy and check record sizes before replacing the original
        #[arg(long)]
        verify: bool,

        /// Chunk size used when streaming unchanged bytes
        #[arg(long, default_value_t = 16 * 1024)]
        buffer_size: usize,

        /// Print the patch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the records enclosing the metadata list are consistent
    Check { file: PathBuf },

    /// Print the record tree of a file
    Tree { file: PathBuf },
}

#[derive(Args, Default)]
pub struct FieldArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub album: Option<String>,
    #[arg(long)]
    pub artist: Option<String>,
    #[arg(long)]
    pub year: Option<String>,
    #[arg(long)]
    pub comment: Option<String>,
    /// Track number, "N" or "N/TOTAL"
    #[arg(long)]
    pub track: Option<String>,
    /// Genre name; standard names are stored in the numeric form
    #[arg(long)]
    pub genre: Option<String>,
}

pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use ilst_core::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    handlers::init_logging(cli.verbose);
    match cli.command {
        Commands::Show { file, json } => handlers::handle_show(file, json),
        Commands::Set {
            file,
            fields,
            verify,
            buffer_size,
            json,
        } => handlers::handle_set(file, fields, verify, buffer_size, json),
        Commands::Check { file } => handlers::handle_check(file),
        Commands::Tree { file } => handlers::handle_tree(file),
    }
}

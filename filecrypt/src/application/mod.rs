pub mod handlers;

use crate::presentation::cli::{Cli, Commands, KeyCommands};
use filecrypt_core::error::Result;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            files,
            key,
            key_hex,
            config,
            workers,
            pool,
            chunk_size,
            quiet,
        } => handlers::handle_run(
            files, key, key_hex, config, workers, pool, chunk_size, quiet,
        ),
        Commands::Key(key_cmd) => match key_cmd {
            KeyCommands::Show { config } => handlers::handle_key_show(config),
            KeyCommands::Set { key, config } => handlers::handle_key_set(key, config),
            KeyCommands::Check { key } => handlers::handle_key_check(key),
        },
    }
}

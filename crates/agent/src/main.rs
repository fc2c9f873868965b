#![forbid(unsafe_code)]

mod cli;
mod commands;
mod startup;

use anyhow::Result;
use domain::alert::query::StateEventQuery;

use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    let output = cli.output;

    match cli.command {
        Command::Version => commands::cmd_version(output),

        Command::Fingerprint { ref labels } => commands::cmd_fingerprint(labels, output),

        Command::Replay { ref file, metrics } => {
            let config = startup::init(&cli)?;
            commands::cmd_replay(&config, file, metrics, output)
        }

        Command::History {
            ref fingerprint,
            limit,
        } => {
            let config = startup::init(&cli)?;
            commands::cmd_history(&config, fingerprint, limit, output)
        }

        Command::Events {
            state,
            reason,
            limit,
            offset,
        } => {
            let config = startup::init(&cli)?;
            let query = StateEventQuery {
                state,
                reason,
                limit,
                offset,
                ..StateEventQuery::default()
            };
            commands::cmd_events(&config, &query, output)
        }

        Command::Stats => {
            let config = startup::init(&cli)?;
            commands::cmd_stats(&config, output)
        }
    }
}

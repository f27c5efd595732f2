use clap::{Arg, ArgAction, ArgMatches, Command};

use objtracker::Config;
use objtracker_postgresql_store::PostgresStore;

fn cli() -> Command {
    Command::new("objtracker")
        .about("pod, vmi and migration snapshot store")
        .version("0.1.1")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("init").about("create the pods, vmis and vmimigrations tables if missing"),
        )
        .subcommand(
            Command::new("drop")
                .about("drop the pods, vmis and vmimigrations tables")
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .help("confirm that all stored snapshots are discarded")
                        .action(ArgAction::SetTrue),
                ),
        )
}

async fn handlers(matches: &ArgMatches, store: &PostgresStore) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("init", _)) => store.init_tables().await?,
        Some(("drop", submatches)) => {
            if !submatches.get_flag("yes") {
                anyhow::bail!("refusing to drop tables without --yes");
            }

            store.drop_tables().await?
        }
        _ => unreachable!(), // subcommand_required
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let matches = cli().get_matches();
    let config = Config::from_env()?;

    let store = PostgresStore::connect(&config.postgres()).await?;

    let result = handlers(&matches, &store).await;

    store.shutdown().await;
    result?;

    tracing::info!("done");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli() {
        cli().debug_assert();

        let matches = cli().try_get_matches_from(["objtracker", "drop", "--yes"]).unwrap();
        let (name, submatches) = matches.subcommand().unwrap();

        assert_eq!(name, "drop");
        assert!(submatches.get_flag("yes"));
        assert!(cli().try_get_matches_from(["objtracker"]).is_err());
    }
}

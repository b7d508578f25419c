mod commands;
mod error;
mod logging;

use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use std::path::PathBuf;
use storefront_config::Config;

/// Product catalog backend with local image uploads.
#[derive(Parser)]
#[command(name = "storefront", version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: storefront/config.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Insert products from a JSON array
    Import {
        /// JSON file containing an array of products
        file: PathBuf,
    },
    /// Delete stored images that no product refers to
    Prune {
        /// Only report what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())
        .and_then(Config::absolutize)
        .or_raise(|| ErrorKind::Config)?;
    logging::init(&config.log);

    match cli.command {
        Command::Serve => commands::serve(&config).await,
        Command::Import { file } => commands::import(&config, &file).await,
        Command::Prune { dry_run } => commands::prune(&config, dry_run).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case::serve(&["storefront", "serve"])]
    #[case::import(&["storefront", "import", "seed.json"])]
    #[case::prune(&["storefront", "prune"])]
    fn test_parse_subcommands(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args.iter().copied()).is_ok());
    }

    #[rstest]
    #[case::no_subcommand(&["storefront"])]
    #[case::import_without_file(&["storefront", "import"])]
    #[case::unknown(&["storefront", "migrate"])]
    fn test_parse_rejects(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args.iter().copied()).is_err());
    }

    #[test]
    fn test_parse_prune() {
        let args = ["storefront", "--config", "/etc/storefront.toml", "prune", "--dry-run"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/storefront.toml")));
        assert!(matches!(cli.command, Command::Prune { dry_run: true }));
    }
}

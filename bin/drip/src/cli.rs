use clap::{Parser, Subcommand};
use drip_common::Address;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "drip")]
#[command(about = "Capped token ledger with a rate-limited faucet", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", env = "DRIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the database directory
    #[arg(short, long, value_name = "DIR")]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy the ledger and the dispenser
    Deploy {
        #[arg(long)]
        deployer: Address,

        /// Bind the dispenser's precomputed address at construction
        #[arg(long)]
        precomputed: bool,
    },
    /// Claim the faucet amount for an account
    Claim { account: Address },
    /// Show an account's balance and claim eligibility
    Status { account: Address },
    /// Pause the faucet
    Pause {
        #[arg(long)]
        admin: Address,
    },
    /// Resume the faucet
    Unpause {
        #[arg(long)]
        admin: Address,
    },
    /// Transfer whole tokens between accounts
    Transfer {
        #[arg(long)]
        from: Address,

        #[arg(long)]
        to: Address,

        amount: u64,
    },
    /// Show token and faucet parameters
    Info,
    /// List journaled events
    Events {
        #[arg(long)]
        account: Option<Address>,
    },
    /// Print metrics in the Prometheus text format.
    ///
    /// Claim totals, supply and the pause flag are restored from the
    /// database. Rejection counts are not persisted and cover this process
    /// only, so a standalone `drip metrics` reports zero rejections.
    Metrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_metrics_help_describes_rejection_scope() {
        let command = Cli::command();
        let metrics = command.find_subcommand("metrics").unwrap();
        let about = metrics.get_long_about().unwrap().to_string();
        assert!(about.contains("Rejection counts are not persisted"));
    }

    #[test]
    fn test_parse_claim() {
        let cli = Cli::try_parse_from([
            "drip",
            "--db",
            "/tmp/drip",
            "claim",
            "0x00000000000000000000000000000000000000a1",
        ])
        .unwrap();

        let mut expected = [0u8; 20];
        expected[19] = 0xa1;
        assert!(matches!(cli.command, Commands::Claim { account } if account == Address(expected)));
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/drip")));
    }
}

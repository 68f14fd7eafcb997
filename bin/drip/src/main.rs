mod cli;
mod config_loader;

use anyhow::{anyhow, Context};
use clap::Parser;
use cli::Commands;
use drip_common::types::{format_units, to_base_units};
use drip_common::utils::logging::init_logging;
use drip_common::Timestamp;
use drip_faucet::{
    ClaimState, DeployStrategy, FaucetConfig, FaucetDatabase, FaucetMetrics, FaucetService, SystemClock,
};
use std::sync::Arc;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // 1. Parse CLI
    let args = cli::Cli::parse();

    // 2. Load config and setup logging
    let config = config_loader::load_drip_config(args.config.as_deref(), args.db, args.debug)?;
    init_logging(&config.logging).map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

    // 3. Open the persisted faucet
    let mut service = open_service(config.faucet)?;

    match args.command {
        Commands::Deploy { deployer, precomputed } => {
            let strategy = if precomputed {
                DeployStrategy::Precomputed
            } else {
                DeployStrategy::TwoPhase
            };
            let deployment = service.deploy(deployer, strategy)?;
            println!("ledger:    {}", deployment.ledger);
            println!("dispenser: {}", deployment.dispenser);
        }
        Commands::Claim { account } => {
            let claim = service.request_tokens(account)?;
            println!(
                "claimed {} for {}, balance {}",
                format_units(claim.amount),
                account,
                format_units(service.balance_of(&account)?)
            );
        }
        Commands::Status { account } => {
            let dispenser = service.dispenser()?;
            println!("account:             {}", account);
            println!("balance:             {}", format_units(service.balance_of(&account)?));
            let last_claim = match dispenser.next_claim_at(&account) {
                Some(_) => format_time(dispenser.last_claim_at(&account)),
                None => "never".to_string(),
            };
            println!("last claim:          {}", last_claim);
            println!("total claimed:       {}", format_units(dispenser.total_claimed(&account)));
            println!("remaining allowance: {}", format_units(service.remaining_allowance(&account)?));
            println!("can claim:           {}", service.can_claim(&account)?);
            match service.status(&account)? {
                ClaimState::Eligible => println!("status:              eligible"),
                ClaimState::CooldownBlocked { retry_at } => {
                    println!("status:              cooling down until {}", format_time(retry_at))
                }
                ClaimState::LimitReached => println!("status:              lifetime limit reached"),
                ClaimState::Paused => println!("status:              faucet paused"),
            }
        }
        Commands::Pause { admin } => {
            service.set_paused(admin, true)?;
            println!("faucet paused");
        }
        Commands::Unpause { admin } => {
            service.set_paused(admin, false)?;
            println!("faucet resumed");
        }
        Commands::Transfer { from, to, amount } => {
            let amount = to_base_units(amount).context("amount out of range")?;
            service.transfer(from, to, amount)?;
            println!("transferred {} from {} to {}", format_units(amount), from, to);
        }
        Commands::Info => {
            let ledger = service.ledger()?;
            let dispenser = service.dispenser()?;
            let metadata = ledger.metadata();
            println!("token:          {} ({}), {} decimals", metadata.name, metadata.symbol, metadata.decimals);
            println!("ledger:         {}", ledger.address());
            println!("owner:          {}", ledger.owner());
            println!("minter:         {}", ledger.authorized_minter());
            println!("total supply:   {}", format_units(ledger.total_supply()));
            println!("max supply:     {}", format_units(ledger.max_supply()));
            println!("remaining:      {}", format_units(ledger.remaining_supply()));
            println!("holders:        {}", ledger.holders());
            println!("dispenser:      {}", dispenser.address());
            println!("admin:          {}", dispenser.admin());
            println!("faucet amount:  {}", format_units(dispenser.faucet_amount()));
            println!("cooldown:       {}s", dispenser.cooldown_time());
            println!("lifetime cap:   {}", format_units(dispenser.max_claim_amount()));
            println!("paused:         {}", dispenser.is_paused());

            let stats = service.statistics();
            println!(
                "claims:         {} by {} account(s), {} dispensed",
                stats.total_claims,
                stats.unique_claimants,
                format_units(stats.total_dispensed)
            );
        }
        Commands::Events { account } => {
            let records = match account {
                Some(account) => service.events_for(&account)?,
                None => service.events()?,
            };
            for record in records {
                println!(
                    "#{:<6} {} {:<14} {:?}",
                    record.seq,
                    format_time(record.timestamp),
                    record.event.name(),
                    record.event
                );
            }
        }
        Commands::Metrics => {
            let metrics = service
                .metrics()
                .context("metrics are disabled (set metrics_enabled = true)")?;
            print!("{}", metrics.gather()?);
        }
    }

    Ok(())
}

fn open_service(config: FaucetConfig) -> anyhow::Result<FaucetService> {
    info!("Opening faucet state at {}", config.db_path);
    let database = FaucetDatabase::new(&config.db_path)
        .with_context(|| format!("failed to open database at {}", config.db_path))?;
    let metrics_enabled = config.metrics_enabled;

    let mut service = FaucetService::new(config, Arc::new(SystemClock))?.with_database(database)?;
    if metrics_enabled {
        service = service.with_metrics(FaucetMetrics::new()?);
    }
    Ok(service)
}

fn format_time(timestamp: Timestamp) -> String {
    chrono::DateTime::from_timestamp(timestamp as i64, 0)
        .map(|time| time.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

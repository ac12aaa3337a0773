//! Config command - show the effective configuration

use std::path::Path;

use crate::style::*;
use anyhow::Result;
use bounty_ledger::Config;

pub fn run(config: &Config, path: &Path) -> Result<()> {
    print_header("Ledger Configuration");

    println!();
    println!(
        "Source:           {}",
        if path.exists() {
            style_cyan(&path.display().to_string())
        } else {
            style_dim("embedded defaults")
        }
    );
    println!(
        "Event journal:    {}",
        if config.ledger.journal {
            style_green("enabled")
        } else {
            style_yellow("disabled")
        }
    );
    println!("Channel capacity: {}", config.ledger.event_channel_capacity);
    println!("Log filter:       {}", config.log_filter());

    println!();
    println!("{}", style_bold("Genesis Accounts:"));
    if config.accounts.is_empty() {
        println!("  {}", style_dim("(none)"));
    }
    for account in &config.accounts {
        println!("  {:<16} {:>10}", account.id, account.balance);
    }

    Ok(())
}

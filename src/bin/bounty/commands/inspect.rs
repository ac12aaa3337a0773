//! Inspect command - show one bounty after replaying a script

use std::path::Path;

use crate::style::print_warning;
use anyhow::{Context, Result};
use bounty_ledger::{script, Config, Script};
use serde_json::json;

pub fn run(config: &Config, script_path: &Path, bounty_id: &str) -> Result<()> {
    let script = Script::load(script_path)?;
    let ledger = script.ledger(config);
    let mismatches = script::mismatches(&script.run(&ledger));
    if mismatches > 0 {
        print_warning(&format!(
            "{} step(s) did not match their expected outcome",
            mismatches
        ));
    }

    let bounty = ledger
        .bounty(bounty_id)
        .with_context(|| format!("Bounty {} not found after replay", bounty_id))?;
    let events: Vec<_> = ledger
        .events()
        .into_iter()
        .filter(|record| record.event.bounty_id() == bounty_id)
        .collect();

    let out = json!({
        "bounty": bounty,
        "propositions": ledger.propositions(bounty_id),
        "events": events,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

//! Replay command - run a script against a fresh ledger

use std::path::Path;

use crate::style::*;
use anyhow::{Context, Result};
use bounty_ledger::{Config, ReplayReport, Script};

/// Returns the number of steps whose outcome differed from `expect`.
pub fn run(config: &Config, script_path: &Path, json: bool) -> Result<usize> {
    let script = Script::load(script_path)?;
    let report = script.replay(config);

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", out);
    } else {
        print_report(&report);
    }

    Ok(report.mismatches())
}

fn print_report(report: &ReplayReport) {
    print_header("Steps");
    for step in &report.steps {
        let target = step.bounty.as_deref().unwrap_or("-");
        let line = format!("{:>3}  {:<32} {:<10}", step.index, step.op, target);
        if !step.matched {
            print_warning(&format!(
                "{} got {}, expected {}",
                line,
                style_red(&step.outcome),
                step.expected.as_deref().unwrap_or("?")
            ));
        } else if step.succeeded() {
            print_success(&line);
        } else {
            println!(
                "{} {} {}",
                style_yellow("•"),
                line,
                style_dim(step.error.as_deref().unwrap_or_default())
            );
        }
    }

    print_header("Bounties");
    if report.bounties.is_empty() {
        println!("{}", style_dim("(none)"));
    }
    for bounty in &report.bounties {
        println!(
            "{:<12} {:<8} issuer {:<12} value {:>8} {}",
            style_bold(&bounty.id),
            style_state(bounty.state),
            bounty.issuer,
            bounty.value,
            if bounty.value_locked {
                style_cyan("locked")
            } else {
                String::new()
            }
        );
    }

    print_header("Balances");
    for balance in &report.balances {
        println!("{:<16} {:>10}", balance.account, balance.balance);
    }
    println!("{:<16} {:>10}", style_dim("escrow"), report.escrowed_total);

    println!();
    println!(
        "{} events, {} unexpected outcome(s)",
        report.events.len(),
        report.mismatches()
    );
}

//! `flakesync diff` - preview what sync would change

use anyhow::{Context as _, Result};

use super::{print_delta, print_plan_header};
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let target = ctx.config.target()?;
    let client = ctx.client()?;

    let plan = reconcile::plan(&client, &target)?;

    if json {
        let out = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
        println!("{out}");
        return Ok(());
    }

    if !ctx.quiet {
        print_plan_header("Diff", &plan, &target.flake, &target.profile);
    }

    if plan.delta.is_empty() {
        ui::success("Profile is up to date");
        return Ok(());
    }

    print_delta(&plan.delta);
    println!();
    ui::info(&ui::delta_summary(
        plan.delta.add.len(),
        plan.delta.remove.len(),
    ));
    Ok(())
}

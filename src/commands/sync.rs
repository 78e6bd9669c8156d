//! `flakesync sync` - converge the profile onto the devShell

use anyhow::Result;
use std::io;

use super::{print_delta, print_plan_header};
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, dry_run: bool) -> Result<()> {
    let target = ctx.config.target()?;
    let client = ctx.client()?;

    let plan = reconcile::plan(&client, &target)?;

    if !ctx.quiet {
        let title = if dry_run { "Sync (dry run)" } else { "Sync" };
        print_plan_header(title, &plan, &target.flake, &target.profile);
        print_delta(&plan.delta);
    }

    if plan.delta.is_empty() {
        ui::success("Profile is up to date");
        return Ok(());
    }

    if dry_run {
        println!();
        ui::info(&format!(
            "Dry run: {}",
            ui::delta_summary(plan.delta.add.len(), plan.delta.remove.len())
        ));
        return Ok(());
    }

    println!();
    let mut progress = io::stderr().lock();
    let summary = reconcile::apply(&client, &target.profile, &plan.delta, &mut progress)
        .map_err(|e| {
            let partial = e.is_partial();
            let err = anyhow::Error::new(e);
            if partial {
                err.context("Profile was partially updated; run sync again to continue")
            } else {
                err
            }
        })?;
    drop(progress);

    ui::success(&format!(
        "Removed {}, installed {}",
        summary.removed, summary.installed
    ));
    log::info!("{} changes applied", summary.total_changes());
    Ok(())
}

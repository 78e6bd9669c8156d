//! `flakesync list` - show what the profile currently holds

use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let profile = ctx.config.profile_path()?;
    let client = ctx.client()?;

    let items = client.profile_items(&profile)?;

    if !ctx.quiet {
        ui::header(&format!("Profile {}", profile.display()));
    }

    if items.is_empty() {
        ui::warn("Profile is empty or does not exist yet");
        return Ok(());
    }

    for item in &items {
        let marker = if item.active { "●".green() } else { "○".dimmed() };
        println!("{marker} {}", item.display_name().bold());

        if ctx.verbose > 0
            && let Some(url) = item.original_url.as_deref().or(item.url.as_deref())
        {
            ui::kv("from", url);
        }
        for path in item.store_paths() {
            ui::dim(path.as_str());
        }
    }

    let paths: usize = items.iter().map(|i| i.store_paths().len()).sum();
    println!();
    ui::info(&format!("{} elements, {paths} store paths", items.len()));
    Ok(())
}

pub mod diff;
pub mod list;
pub mod sync;

use crate::ui;
use reconcile::{Delta, Plan};
use storekit::StorePath;

/// Print the delta of a plan, removals first
pub fn print_delta(delta: &Delta<StorePath>) {
    for path in &delta.remove {
        ui::removed(path);
    }
    for path in &delta.add {
        ui::added(path);
    }
}

/// Print the plan header shared by `sync` and `diff`
pub fn print_plan_header(title: &str, plan: &Plan, flake: &str, profile: &std::path::Path) {
    ui::header(title);
    ui::kv("flake", flake);
    ui::kv("profile", &profile.display().to_string());
    ui::kv("system", &plan.system);
    println!();
}

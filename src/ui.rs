use colored::Colorize;
use storekit::StorePath;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// `+ name@version  /nix/store/...`, uncolored
pub fn added_line(path: &StorePath) -> String {
    format!("+ {}  {}", path.label(), path)
}

/// `- name@version  /nix/store/...`, uncolored
pub fn removed_line(path: &StorePath) -> String {
    format!("- {}  {}", path.label(), path)
}

/// Print one store path to be installed
pub fn added(path: &StorePath) {
    println!("{}", added_line(path).green());
}

/// Print one store path to be removed
pub fn removed(path: &StorePath) {
    println!("{}", removed_line(path).red());
}

/// `N to add, M to remove`
pub fn delta_summary(add: usize, remove: usize) -> String {
    format!("{add} to add, {remove} to remove")
}

/// Print an error and its causes, then the advice for its category
pub fn report_error(err: &anyhow::Error) {
    error(&err.to_string());
    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "caused by:".dimmed(), cause);
    }

    let category = err
        .chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<reconcile::ReconcileError>()
                .map(reconcile::ReconcileError::category)
                .or_else(|| cause.downcast_ref::<storekit::Error>().map(storekit::Error::category))
        });

    if let Some(category) = category {
        eprintln!(
            "  {} {}: {}",
            "hint:".yellow(),
            category.description(),
            category.advice()
        );
    }
}

//! Clean command implementation

use anyhow::Result;
use std::fs;

use nf_core::tables::Table;

use crate::cli::{CleanArgs, GlobalArgs};
use crate::commands::common::load_config;

/// Execute the clean command
pub async fn execute(args: &CleanArgs, global: &GlobalArgs) -> Result<()> {
    let (config, root) = load_config(global)?;
    let output_root = config.output_root_path(&root);

    if args.dry_run {
        println!("Dry run - would remove the following tables:");
    } else {
        println!("Cleaning output of: {}", config.name);
    }

    let mut removed_count = 0;
    let mut skipped_count = 0;

    for table in Table::ALL {
        let table_path = output_root.join(table.name());

        if !table_path.exists() {
            if global.verbose {
                println!("  Skipping (not found): {}", table_path.display());
            }
            skipped_count += 1;
            continue;
        }

        if args.dry_run {
            println!("  Would remove: {}", table_path.display());
            removed_count += 1;
            continue;
        }

        match fs::remove_dir_all(&table_path) {
            Ok(_) => {
                println!("  Removed: {}", table_path.display());
                removed_count += 1;
            }
            Err(e) => {
                eprintln!("  Failed to remove {}: {}", table_path.display(), e);
            }
        }
    }

    println!();
    if args.dry_run {
        println!(
            "Would remove {} table{}, {} not found",
            removed_count,
            if removed_count == 1 { "" } else { "s" },
            skipped_count
        );
    } else {
        println!(
            "Removed {} table{}, {} skipped",
            removed_count,
            if removed_count == 1 { "" } else { "s" },
            skipped_count
        );
    }

    Ok(())
}

#[cfg(test)]
#[path = "clean_test.rs"]
mod tests;

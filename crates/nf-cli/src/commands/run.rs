//! Run command implementation

use anyhow::Result;
use std::sync::Arc;

use nf_core::time::TimezoneMode;
use nf_etl::pipeline;
use nf_store::{LocalStore, TableWriter};

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::common::load_config;

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let (mut config, root) = load_config(global)?;
    if args.utc {
        config.timezone = TimezoneMode::Utc;
    }

    println!("Running pipeline: {}", config.name);
    if global.verbose {
        println!("  input:    {}", config.input_root_path(&root).display());
        println!("  output:   {}", config.output_root_path(&root).display());
        println!("  timezone: {}", config.timezone);
    }

    let store = Arc::new(LocalStore::new(config.output_root_path(&root)));
    let writer = TableWriter::new(store, config.write_attempts);

    let summary = match pipeline::run(&config, &root, &writer).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("  \u{2717} run {} failed: {}", writer.run_id(), e);
            return Err(e.into());
        }
    };

    for report in &summary.tables {
        println!(
            "  \u{2713} {} ({} rows) [{}ms]",
            report.table,
            report.rows,
            report.duration.as_millis()
        );
    }
    println!();
    println!(
        "Completed run {} ({} rows across {} tables)",
        summary.run_id,
        summary.total_rows(),
        summary.tables.len()
    );

    Ok(())
}

//! Validate command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common::load_config;

/// Execute the validate command
pub async fn execute(_args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let (config, root) = load_config(global)?;

    println!("Config OK: {}", config.name);
    println!("  input root:     {}", config.input_root_path(&root).display());
    println!("  catalog glob:   {}", config.catalog_glob);
    println!("  events glob:    {}", config.events_glob);
    println!("  output root:    {}", config.output_root_path(&root).display());
    println!("  timezone:       {}", config.timezone);
    println!("  write attempts: {}", config.write_attempts);
    match &config.storage {
        Some(creds) => println!(
            "  storage creds:  access key {}",
            mask_key(&creds.access_key_id)
        ),
        None => println!("  storage creds:  none"),
    }

    Ok(())
}

/// Shorten an access key id for display; the secret itself is never printed.
fn mask_key(key: &str) -> String {
    if key.len() <= 4 {
        return "****".to_string();
    }
    format!("{}****", &key[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key_keeps_prefix_only() {
        assert_eq!(mask_key("AKIAEXAMPLE"), "AKIA****");
        assert_eq!(mask_key("AK"), "****");
        assert_eq!(mask_key(""), "****");
    }
}

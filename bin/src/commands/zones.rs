//! Zones command implementation.

use anyhow::Result;
use qdown_lib::{DEFAULT_ZONE, ZoneRegistry};

/// Print the known zones and their IO and listing endpoints.
pub(crate) fn list_zones() -> Result<()> {
    let zones = ZoneRegistry::global().all();

    println!("{:<6} {:<28} {:<32} {:<32}", "ZONE", "NAME", "IO", "RSF");
    println!("{}", "-".repeat(100));

    for zone in &zones {
        let marker = if zone.name == DEFAULT_ZONE { "*" } else { "" };
        println!(
            "{:<6} {:<28} {:<32} {:<32}",
            format!("{}{marker}", zone.name),
            zone.description,
            zone.io,
            zone.rsf
        );
    }

    println!("\nTotal: {} zones (* default)", zones.len());
    Ok(())
}

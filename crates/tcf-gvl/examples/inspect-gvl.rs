//! Example: Load a vendor list mirror and summarise what vendors declare.
//!
//! Usage: `cargo run -p tcf-gvl --example inspect-gvl -- <mirror-dir> [language]`

use std::sync::Arc;
use tcf_core::VendorListVersion;
use tcf_gvl::{Declaration, DirectoryLoader, GvlRegistry};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| "gvl".to_string());
    let language = args.next();

    println!("Loading vendor list from {dir}/...\n");

    let loader = match DirectoryLoader::new(&dir) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("\nPass a directory containing vendor-list.json");
            return Err(e.into());
        }
    };

    let registry = GvlRegistry::from_loader(Arc::new(loader), VendorListVersion::Latest).await?;

    if let Some(language) = language {
        let outcome = registry.change_language(&language).await?;
        println!("Language {language}: {outcome:?}\n");
    }

    let document = registry.vendor_list()?;
    println!(
        "✓ Vendor list v{} (policy v{}, updated {})",
        document.vendor_list_version(),
        document.tcf_policy_version(),
        document.last_updated()
    );
    println!(
        "  {} working vendors, {} including deleted",
        document.vendors().len(),
        document.full_vendor_list().len()
    );
    println!(
        "  {} purposes, {} special purposes, {} features, {} stacks\n",
        document.purposes().len(),
        document.special_purposes().len(),
        document.features().len(),
        document.stacks().len()
    );

    for purpose in document.purposes().values() {
        let consent = registry.vendors_with(Declaration::ConsentPurpose, purpose.id)?;
        let leg_int = registry.vendors_with(Declaration::LegitimateInterestPurpose, purpose.id)?;
        println!("  • Purpose {}: {}", purpose.id, purpose.name);
        println!(
            "    consent: {}, legitimate interest: {}",
            consent.len(),
            leg_int.len()
        );
    }

    if let Some(special_features) = document.special_features() {
        println!();
        for feature in special_features.values() {
            let vendors = registry.vendors_with_special_feature(feature.id)?;
            println!("  • Special feature {}: {} ({} vendors)", feature.id, feature.name, vendors.len());
        }
    }

    Ok(())
}

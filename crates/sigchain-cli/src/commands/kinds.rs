use crate::cli::KindsArgs;
use anyhow::Result;
use serde::Serialize;
use sigchain_processing::FilterKind;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct KindInfo {
    kind: &'static str,
    name: &'static str,
    params: BTreeMap<String, f64>,
}

pub fn execute(args: KindsArgs) -> Result<()> {
    let kinds: Vec<KindInfo> = FilterKind::ALL
        .iter()
        .map(|kind| KindInfo {
            kind: kind.as_str(),
            name: kind.display_name(),
            params: kind.default_stage().params(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&kinds)?);
        return Ok(());
    }

    println!("  {:<16} {:<24} {}", "Kind", "Name", "Defaults");
    println!("  {}", "-".repeat(64));
    for info in &kinds {
        let defaults = info
            .params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {:<16} {:<24} {}", info.kind, info.name, defaults);
    }
    Ok(())
}

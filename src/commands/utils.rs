use crate::extract::{EventPolicy, FieldRule};
use crate::utils::config::{IngestConfig, REPORT_SCHEMA_VERSION};

/// Display the effective extraction policies
pub fn display_policies(config: &IngestConfig) {
    println!("Decode errors: {:?}", config.on_decode_error);
    println!("Registered policies: {}", config.policies.len());
    println!();

    for (name, policy) in config.policies.iter() {
        println!("  {:<32} {}", name, describe_policy(policy));
    }
    println!("  {:<32} flat", "(any other event)");
}

/// One-line description of a policy, e.g. `decompose(header) + decompose_first(frames)`
pub fn describe_policy(policy: &EventPolicy) -> String {
    match policy {
        EventPolicy::Flat => "flat".to_string(),
        EventPolicy::Decompose(rules) => {
            let whole: Vec<&str> = rules
                .iter()
                .filter(|r| matches!(r, FieldRule::Whole(_)))
                .map(|r| r.field())
                .collect();
            let first: Vec<&str> = rules
                .iter()
                .filter(|r| matches!(r, FieldRule::First(_)))
                .map(|r| r.field())
                .collect();

            let mut parts = Vec::new();
            if !whole.is_empty() {
                parts.push(format!("decompose({})", whole.join(", ")));
            }
            if !first.is_empty() {
                parts.push(format!("decompose_first({})", first.join(", ")));
            }
            parts.join(" + ")
        }
    }
}

/// Display version information
pub fn display_version() {
    println!("qlog-series v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", REPORT_SCHEMA_VERSION);
    println!();
    println!("Turns qlog-style event traces into per-field time series.");
}

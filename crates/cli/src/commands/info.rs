//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::ServiceConfig;
use dispatcher::Dispatcher;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    service: ServiceInfo,
    sink: SinkInfo,
    subscriptions: Vec<SubscriptionInfo>,
    time_fields: Vec<TimeFieldInfo>,
}

#[derive(Serialize)]
struct ServiceInfo {
    consumer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
    max_redeliveries: u32,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct SubscriptionInfo {
    subject: String,
    content_type: String,
    transformer: String,
}

#[derive(Serialize)]
struct TimeFieldInfo {
    field_name: String,
    field_format: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config, &Dispatcher::default());
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &ServiceConfig, dispatcher: &Dispatcher) -> ConfigInfo {
    let subscriptions = dispatcher
        .bindings()
        .iter()
        .map(|binding| SubscriptionInfo {
            subject: binding.subject.clone(),
            content_type: binding.content_type.clone(),
            transformer: dispatcher
                .registry()
                .resolve(&binding.content_type)
                .map(|t| t.kind().to_string())
                .unwrap_or_else(|e| format!("unresolved: {e}")),
        })
        .collect();

    let time_fields = dispatcher
        .registry()
        .time_fields()
        .iter()
        .map(|field| TimeFieldInfo {
            field_name: field.field_name.clone(),
            field_format: format!("{:?}", field.field_format),
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", config.version),
        service: ServiceInfo {
            consumer_id: config.service.consumer_id.clone(),
            metrics_port: config.service.metrics_port,
            max_redeliveries: config.service.max_redeliveries,
        },
        sink: SinkInfo {
            name: config.sink.name.clone(),
            sink_type: config.sink.sink_type.as_str().to_string(),
            params: config
                .sink
                .params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        },
        subscriptions,
        time_fields,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Message Consumer Configuration                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🆔 Service");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Consumer: {}", info.service.consumer_id);
    match info.service.metrics_port {
        Some(port) => println!("   ├─ Metrics port: {}", port),
        None => println!("   ├─ Metrics port: disabled"),
    }
    println!("   └─ Max redeliveries: {}", info.service.max_redeliveries);

    println!("\n📤 Sink");
    println!("   ├─ Name: {}", info.sink.name);
    if info.sink.params.is_empty() {
        println!("   └─ Type: {}", info.sink.sink_type);
    } else {
        println!("   ├─ Type: {}", info.sink.sink_type);
        println!("   └─ Params:");
        for (i, (key, value)) in info.sink.params.iter().enumerate() {
            let prefix = if i == info.sink.params.len() - 1 { "└─" } else { "├─" };
            println!("        {} {} = {}", prefix, key, value);
        }
    }

    println!("\n🔀 Subscriptions ({})", info.subscriptions.len());
    for (i, sub) in info.subscriptions.iter().enumerate() {
        let prefix = if i == info.subscriptions.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} {} → {} ({})",
            prefix, sub.subject, sub.content_type, sub.transformer
        );
    }

    println!("\n⏱  JSON time fields ({})", info.time_fields.len());
    for (i, field) in info.time_fields.iter().enumerate() {
        let prefix = if i == info.time_fields.len() - 1 { "└─" } else { "├─" };
        println!("   {} {} ({})", prefix, field.field_name, field.field_format);
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_lists_default_subscriptions() {
        let config = config_loader::ConfigLoader::load_from_str(
            r#"
[service]
consumer_id = "writer"
max_redeliveries = 2

[sink]
name = "records"
sink_type = "file"

[sink.params]
path = "records.jsonl"
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_config_info(&config, &Dispatcher::default());

        assert_eq!(info.service.max_redeliveries, 2);
        assert_eq!(info.sink.params.get("path").map(String::as_str), Some("records.jsonl"));
        assert_eq!(info.subscriptions.len(), 2);
        assert_eq!(info.subscriptions[0].subject, "messages.>");
        assert!(!info.subscriptions[0].transformer.starts_with("unresolved"));
        assert_eq!(info.time_fields.len(), 4);
    }
}

//! Configuration validation
//!
//! Rules:
//! - consumer_id is non-empty and has no whitespace
//! - metrics_port, when set, is non-zero
//! - sink name is non-empty
//! - file sinks name a `path`, notify sinks name at least one `to` recipient

use contracts::{ContractError, ServiceConfig, SinkConfig, SinkType};

/// Validate a ServiceConfig
///
/// Returns the first error encountered.
pub fn validate(config: &ServiceConfig) -> Result<(), ContractError> {
    validate_service(config)?;
    validate_sink(&config.sink)?;
    Ok(())
}

fn validate_service(config: &ServiceConfig) -> Result<(), ContractError> {
    let id = &config.service.consumer_id;
    if id.trim().is_empty() {
        return Err(ContractError::config_validation(
            "service.consumer_id",
            "consumer_id must not be empty",
        ));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(ContractError::config_validation(
            "service.consumer_id",
            format!("consumer_id must not contain whitespace, got '{id}'"),
        ));
    }
    if config.service.metrics_port == Some(0) {
        return Err(ContractError::config_validation(
            "service.metrics_port",
            "metrics_port must be > 0",
        ));
    }
    Ok(())
}

fn validate_sink(sink: &SinkConfig) -> Result<(), ContractError> {
    if sink.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name must not be empty",
        ));
    }

    match sink.sink_type {
        SinkType::Log => Ok(()),
        SinkType::File => require_param(sink, "path"),
        SinkType::Notify => {
            require_param(sink, "to")?;
            let has_recipient = sink
                .param("to")
                .is_some_and(|to| to.split(',').any(|t| !t.trim().is_empty()));
            if !has_recipient {
                return Err(ContractError::config_validation(
                    format!("sink[{}].params.to", sink.name),
                    "at least one recipient is required",
                ));
            }
            Ok(())
        }
    }
}

fn require_param(sink: &SinkConfig, key: &str) -> Result<(), ContractError> {
    match sink.param(key) {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(ContractError::config_validation(
            format!("sink[{}].params.{key}", sink.name),
            format!("{} sink requires '{key}'", sink.sink_type.as_str()),
        )),
    }
}

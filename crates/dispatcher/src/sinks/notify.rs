//! NotifyConsumer - turns deliveries into notifications

use std::collections::HashMap;

use contracts::{Consumable, Consumer, ContractError, Record, RecordValue};
use tracing::{info, instrument};

/// Outgoing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub content: String,
}

/// Notification transport (SMS gateway, mailer...)
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), ContractError>;
}

/// Notifier that logs instead of sending
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), ContractError> {
        info!(
            from = %notification.from,
            to = ?notification.to,
            subject = %notification.subject,
            content = %notification.content,
            "notification"
        );
        Ok(())
    }
}

/// Consumer that sends one notification per delivery
pub struct NotifyConsumer<N> {
    name: String,
    from: String,
    to: Vec<String>,
    notifier: N,
}

impl<N: Notifier + Sync> NotifyConsumer<N> {
    pub fn new(
        name: impl Into<String>,
        from: impl Into<String>,
        to: Vec<String>,
        notifier: N,
    ) -> Self {
        Self {
            name: name.into(),
            from: from.into(),
            to,
            notifier,
        }
    }

    /// Create from params map: `to` is a comma-separated recipient list,
    /// `from` is optional
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
        notifier: N,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let to: Vec<String> = params
            .get("to")
            .map(|to| {
                to.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if to.is_empty() {
            return Err(ContractError::config_validation(
                format!("sink.{name}.params.to"),
                "at least one recipient is required",
            ));
        }
        let from = params.get("from").cloned().unwrap_or_default();
        Ok(Self::new(name, from, to, notifier))
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn build(&self, input: &Consumable) -> Notification {
        let (subject, content) = match input {
            Consumable::Records(records) => {
                let channel = records.first().map(|r| r.channel.as_str()).unwrap_or("");
                let lines: Vec<String> = records.iter().map(describe).collect();
                (format!("[{channel}] {} new records", records.len()), lines.join("\n"))
            }
            Consumable::Raw(msg) => (
                format!("[{}] {}", msg.channel, msg.subject),
                String::from_utf8_lossy(&msg.payload).into_owned(),
            ),
        };

        Notification {
            from: self.from.clone(),
            to: self.to.clone(),
            subject,
            content,
        }
    }
}

fn describe(record: &Record) -> String {
    let value = match &record.value {
        Some(RecordValue::Float(v)) => v.to_string(),
        Some(RecordValue::String(s)) | Some(RecordValue::Data(s)) => s.clone(),
        Some(RecordValue::Bool(b)) => b.to_string(),
        None => record.sum.map(|s| format!("sum {s}")).unwrap_or_default(),
    };
    match &record.unit {
        Some(unit) => format!("{} = {value} {unit} @ {}", record.name, record.time.to_rfc3339()),
        None => format!("{} = {value} @ {}", record.name, record.time.to_rfc3339()),
    }
}

impl<N: Notifier + Sync> Consumer for NotifyConsumer<N> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "notify_consumer_consume",
        skip(self, input),
        fields(consumer = %self.name, recipients = self.to.len())
    )]
    async fn consume(&self, input: Consumable) -> Result<(), ContractError> {
        if input.is_empty() {
            return Ok(());
        }
        let notification = self.build(&input);
        self.notifier.notify(&notification).await
    }
}

use anyhow::{Context as _, Result};
use std::fmt;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as tfmt, EnvFilter, Layer};

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub ts: i64,
    pub level: String,
    pub message: String,
}

/// Forwards every event to the Logs tab.
pub struct ChannelLayer {
    tx: Mutex<Sender<LogEntry>>,
}

impl ChannelLayer {
    pub fn new() -> (Self, Receiver<LogEntry>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Mutex::new(tx) }, rx)
    }
}

impl<S: Subscriber> Layer<S> for ChannelLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let entry = LogEntry {
            ts: chrono::Utc::now().timestamp(),
            level: event.metadata().level().to_string().to_lowercase(),
            message: visitor.finish(),
        };
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send(entry);
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

/// Installs the global subscriber: a daily rolling file under `logs_dir` plus
/// the in-app feed. The guard must live as long as the process.
pub fn init(logs_dir: &Path) -> Result<(WorkerGuard, Receiver<LogEntry>)> {
    std::fs::create_dir_all(logs_dir).with_context(|| format!("create {:?}", logs_dir))?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "crust-browser.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,crust_browser=debug"));

    let (channel, rx) = ChannelLayer::new();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tfmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .with(channel)
        .try_init()
        .context("install tracing subscriber")?;

    Ok((guard, rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_layer_captures_message_and_fields() {
        let (layer, rx) = ChannelLayer::new();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(cid = "QmA", attempt = 2, "preview attempt failed");
        });

        let e = rx.try_recv().unwrap();
        assert_eq!(e.level, "warn");
        assert!(e.message.starts_with("preview attempt failed"));
        assert!(e.message.contains("cid=QmA"));
        assert!(e.message.contains("attempt=2"));
    }
}

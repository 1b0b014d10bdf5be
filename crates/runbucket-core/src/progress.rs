use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    BatchStarted { total: usize, workers: usize },
    ItemStarted { name: String },
    ItemSucceeded { name: String, destination: PathBuf },
    ItemFailed { name: String, error: String },
    BatchFinished { succeeded: usize, failed: usize },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: TransferEvent);
}

/// Reports transfer progress through `tracing`.
#[derive(Debug, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn on_event(&self, event: TransferEvent) {
        match event {
            TransferEvent::BatchStarted { total, workers } => {
                info!(total, workers, "Starting batch download");
            }
            TransferEvent::ItemStarted { name } => debug!(object = %name, "Download started"),
            TransferEvent::ItemSucceeded { name, destination } => {
                info!(object = %name, destination = %destination.display(), "Downloaded object");
            }
            TransferEvent::ItemFailed { name, error } => {
                warn!(object = %name, error = %error, "Failed to download object");
            }
            TransferEvent::BatchFinished { succeeded, failed } => {
                info!(succeeded, failed, "Batch download completed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = TransferEvent::ItemFailed { name: "a/b".to_string(), error: "denied".to_string() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "item_failed");
        assert_eq!(json["name"], "a/b");
    }
}

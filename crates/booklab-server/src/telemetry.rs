use std::thread;

use chrono::{DateTime, Utc};
use flume::{Receiver, Sender};
use futures::executor;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CatalogResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    RecordCreated {
        id: String,
        timestamp: DateTime<Utc>,
    },
    RecordUpdated {
        id: String,
        timestamp: DateTime<Utc>,
    },
    RecordDeleted {
        id: String,
        timestamp: DateTime<Utc>,
    },
    AssetStored {
        reference: String,
        timestamp: DateTime<Utc>,
    },
    UserRegistered {
        email: String,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Clone)]
pub struct TelemetryHub {
    tx: Sender<CatalogEvent>,
}

impl TelemetryHub {
    pub fn new(buffer: usize) -> Self {
        let (tx, rx) = flume::bounded(buffer);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(Self::drain(rx));
        } else {
            thread::spawn(|| {
                executor::block_on(async {
                    Self::drain(rx).await;
                });
            });
        }
        Self { tx }
    }

    pub fn publish(&self, event: CatalogEvent) -> CatalogResult<()> {
        self.tx
            .send(event)
            .map_err(|err| crate::error::CatalogError::Internal(err.to_string()))
    }

    async fn drain(rx: Receiver<CatalogEvent>) {
        while let Ok(event) = rx.recv_async().await {
            info!(event = ?event, "catalog event");
        }
    }
}

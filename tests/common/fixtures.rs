//! Test fixtures shared by the integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tubeloader::download::{
    Broadcaster, Downloader, MediaTool, ProgressEvent, Strategy, StrategyCatalog, Subscription,
};

/// Catalog of argument-less strategies with the given names, in order.
pub fn catalog_of(names: &[&str]) -> StrategyCatalog {
    let strategies = names
        .iter()
        .map(|name| Strategy::new(name, Vec::<String>::new()))
        .collect();
    StrategyCatalog::new(strategies).expect("non-empty catalog")
}

/// Downloader with no backoff between strategies, writing into `dir`.
pub fn test_downloader(tool: Arc<dyn MediaTool>, catalog: StrategyCatalog, dir: &Path) -> Arc<Downloader> {
    Arc::new(Downloader::new(tool, catalog, Arc::new(Broadcaster::new()), dir).with_backoff_step(Duration::ZERO))
}

/// Everything currently queued for a subscriber, decoded.
pub fn drain_events(subscription: &mut Subscription) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(payload) = subscription.receiver.try_recv() {
        events.push(serde_json::from_str(&payload).expect("valid event json"));
    }
    events
}

pub fn terminal_count(events: &[ProgressEvent]) -> usize {
    events.iter().filter(|e| e.is_terminal()).count()
}

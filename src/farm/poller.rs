use crate::farm::client::FarmClient;
use crate::farm::parser;
use crate::model::StatusSnapshot;
use tokio::sync::{mpsc, watch};
use tokio::time;

/// Delivered by the background worker after each fetch-parse cycle. A
/// snapshot is immutable once sent; consumers never see partial state.
#[derive(Debug)]
pub enum FarmEvent {
    Snapshot(StatusSnapshot),
    Error(String),
}

/// Periodic fetch-parse worker for one platform page. Polls once
/// immediately, then sleeps on the watched interval between cycles.
pub struct Poller {
    client: FarmClient,
    page_url: String,
    tx: mpsc::UnboundedSender<FarmEvent>,
    interval_rx: watch::Receiver<u64>,
}

impl Poller {
    pub fn new(
        client: FarmClient,
        page_url: String,
        tx: mpsc::UnboundedSender<FarmEvent>,
        interval_rx: watch::Receiver<u64>,
    ) -> Self {
        Self {
            client,
            page_url,
            tx,
            interval_rx,
        }
    }

    pub async fn run(self) {
        self.poll_once().await;

        loop {
            let interval = *self.interval_rx.borrow();
            time::sleep(time::Duration::from_secs(interval)).await;
            self.poll_once().await;
        }
    }

    async fn poll_once(&self) {
        let event = match self.client.fetch_page(&self.page_url).await {
            Ok(html) => FarmEvent::Snapshot(parser::parse_status_page(&html)),
            Err(e) => FarmEvent::Error(e.to_string()),
        };
        if self.tx.send(event).is_err() {
            tracing::warn!("poll: channel closed");
        }
    }
}

//! Connectivity probe feeding the reconnect trigger.

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::event::Event;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Whether a TCP connection to `host:port` can be opened in time.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> bool {
  match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
    Ok(Ok(_)) => true,
    Ok(Err(e)) => {
      debug!(host, port, error = %e, "connectivity probe failed");
      false
    }
    Err(_) => {
      debug!(host, port, "connectivity probe timed out");
      false
    }
  }
}

/// Probe `host:port` every `interval` and send `Event::Connectivity` on
/// each transition. The first result is reported only when offline.
pub fn spawn_probe(
  host: String,
  port: u16,
  interval: Duration,
  tx: mpsc::UnboundedSender<Event>,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut online = true;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
      ticker.tick().await;
      let reachable = probe(&host, port, CONNECT_TIMEOUT).await;
      if reachable == online {
        continue;
      }
      online = reachable;
      if tx.send(Event::Connectivity(online)).is_err() {
        break;
      }
    }
  })
}

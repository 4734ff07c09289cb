use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::board::*;

/// Reloads the data feed on a fixed interval and publishes the result on the
/// board.
///
/// The first refresh happens right away. A refresh is awaited before the next
/// tick is considered, so refreshes never overlap; ticks missed while a slow
/// refresh runs are skipped.
pub struct Poller {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn start<F>(board: SharedBoard, feed: DataFeed, interval: Duration, on_refresh: F) -> Poller
    where
        F: Fn(&BoardView) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let res = refresh(feed.clone()).await;
                        board.apply_refresh(res);
                        on_refresh(&board.current());
                    }
                    _ = stop_rx.changed() => {
                        debug!("Poller: stop requested");
                        break;
                    }
                }
            }
        });

        Poller { stop_tx, handle }
    }

    /// Stops the loop and waits for it. A refresh in progress completes first.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!("Poller: the refresh task failed: {}", e);
        }
    }
}

// File parsing is blocking. Errors are turned into their message here, which
// is what the board keeps.
async fn refresh(feed: DataFeed) -> Result<Standings, String> {
    let res = tokio::task::spawn_blocking(move || feed.load().map_err(|e| e.user_message())).await;
    match res {
        Ok(r) => r,
        Err(e) => Err(format!("The refresh was aborted: {}", e)),
    }
}

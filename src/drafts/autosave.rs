use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::DraftService;
use crate::wizard::FormSession;

/// Keeps the periodic auto-save running; dropping it stops the timer.
/// Saves already in flight are not cancelled.
pub struct AutosaveHandle {
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    pub fn stop(self) {}
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Save the session's draft every `interval` while its draft toggle is on.
///
/// Each tick's save runs in its own task. Ticks do not wait for earlier saves, so a slow
/// save can overlap the next one; the store keeps whichever write lands last.
pub fn spawn_autosave(
    service: Arc<DraftService>,
    session: Arc<Mutex<FormSession>>,
    interval: Duration,
) -> AutosaveHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let snapshot = {
                let mut session = session.lock().await;
                if !session.save_as_draft() {
                    debug!("Auto-save skipped, draft mode is off");
                    continue;
                }
                session.ensure_id();
                session.draft().clone()
            };

            let service = service.clone();
            let session = session.clone();
            tokio::spawn(async move {
                let mut draft = snapshot;
                match service.save(&mut draft, Vec::new()).await {
                    Ok(outcome) => {
                        info!("Auto-saved listing {}", outcome.id);
                        session.lock().await.absorb_saved(&draft);
                    }
                    Err(e) => warn!("Auto-save failed: {}", e),
                }
            });
        }
    });

    AutosaveHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ListingStore, MemoryBackend};
    use crate::models::ListingDraft;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_reuses_one_record() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let service = Arc::new(DraftService::with_backend(backend.clone()));
        let mut draft = ListingDraft::new();
        draft.address = "15200 FM 1826".to_string();
        let session = Arc::new(Mutex::new(FormSession::new(draft)));

        let handle = spawn_autosave(service, session.clone(), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(95)).await;
        settle().await;
        handle.stop();

        assert_eq!(backend.listing_count().await, 1);
        let (inserts, updates) = backend.write_counts();
        assert_eq!(inserts, 1);
        assert_eq!(updates, 2);

        let session = session.lock().await;
        let id = session.draft().id.expect("auto-save assigns the id");
        assert!(session.draft().created_at.is_some());
        let row = backend.fetch(id).await.unwrap().unwrap();
        assert_eq!(row.address, "15200 FM 1826");
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_idle_when_draft_mode_off() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let service = Arc::new(DraftService::with_backend(backend.clone()));
        let mut draft = ListingDraft::new();
        draft.is_draft = false;
        let session = Arc::new(Mutex::new(FormSession::new(draft)));

        let _handle = spawn_autosave(service, session.clone(), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(95)).await;
        settle().await;

        assert_eq!(backend.listing_count().await, 0);
        assert!(session.lock().await.draft().id.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_autosave_does_not_fire() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let service = Arc::new(DraftService::with_backend(backend.clone()));
        let session = Arc::new(Mutex::new(FormSession::new(ListingDraft::new())));

        spawn_autosave(service, session, Duration::from_secs(30)).stop();
        tokio::time::sleep(Duration::from_secs(95)).await;
        settle().await;

        assert_eq!(backend.listing_count().await, 0);
    }
}

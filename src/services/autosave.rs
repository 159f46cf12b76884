//! Debounced autosave.
//!
//! Subscribes to store change events and writes a snapshot of a quotation
//! once it has been quiet for the debounce delay. Every new event for the
//! same quotation pushes its deadline back, so only the most recent state is
//! written. Deleting a quotation drops its pending save and removes its
//! snapshot so it is not restored on the next start.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::Quotation;
use crate::services::store::{QuotationEvent, QuotationStore};

/// Destination for quotation snapshots.
pub trait SnapshotSink: Send + Sync + 'static {
    fn save(&self, quotation: Quotation) -> BoxFuture<'static, Result<()>>;

    /// Forget a deleted quotation. Deleting an unknown id is not an error.
    fn delete(&self, id: Uuid) -> BoxFuture<'static, Result<()>>;
}

/// Writes one pretty-printed JSON document per quotation into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl SnapshotSink for DirectorySink {
    fn save(&self, quotation: Quotation) -> BoxFuture<'static, Result<()>> {
        let dir = self.dir.clone();
        let path = self.path_for(quotation.id);
        async move {
            let body = serde_json::to_vec_pretty(&quotation)
                .context("Failed to serialize quotation snapshot")?;
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;

            // Write then rename so a crash never leaves a truncated document.
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, body)
                .await
                .with_context(|| format!("Failed to write {}", tmp.display()))?;
            tokio::fs::rename(&tmp, &path)
                .await
                .with_context(|| format!("Failed to move snapshot to {}", path.display()))?;

            debug!(quotation_id = %quotation.id, revision = quotation.revision, "Snapshot written");
            Ok(())
        }
        .boxed()
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'static, Result<()>> {
        let path = self.path_for(id);
        async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(quotation_id = %id, "Snapshot removed");
                    Ok(())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
            }
        }
        .boxed()
    }
}

/// Used when no snapshot directory is configured.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl SnapshotSink for LogSink {
    fn save(&self, quotation: Quotation) -> BoxFuture<'static, Result<()>> {
        async move {
            info!(
                quotation_id = %quotation.id,
                revision = quotation.revision,
                total_with_vat = %quotation.pricing.total_with_vat,
                "Autosave (no snapshot directory configured)"
            );
            Ok(())
        }
        .boxed()
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'static, Result<()>> {
        async move {
            info!(quotation_id = %id, "Autosave discarded (no snapshot directory configured)");
            Ok(())
        }
        .boxed()
    }
}

/// Read every snapshot in `dir`. A missing directory yields nothing;
/// unreadable documents are skipped with a warning.
pub async fn load_snapshots(dir: &Path) -> Result<Vec<Quotation>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", dir.display()));
        }
    };

    let mut quotations = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match serde_json::from_slice::<Quotation>(&bytes) {
            Ok(quotation) => quotations.push(quotation),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot"),
        }
    }
    Ok(quotations)
}

/// Handle to the running autosave task.
pub struct Autosave {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Autosave {
    /// Start the debounce loop for `store`.
    pub fn spawn(store: QuotationStore, sink: Arc<dyn SnapshotSink>, debounce: Duration) -> Self {
        let events = store.subscribe();
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(store, sink, debounce, events, shutdown_rx));
        info!(debounce_ms = debounce.as_millis() as u64, "Autosave started");
        Self { shutdown, task }
    }

    /// Flush pending saves and stop.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            error!(error = %e, "Autosave task failed");
        }
    }
}

async fn run(
    store: QuotationStore,
    sink: Arc<dyn SnapshotSink>,
    debounce: Duration,
    mut events: tokio::sync::broadcast::Receiver<QuotationEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut pending: HashMap<Uuid, Instant> = HashMap::new();

    loop {
        let next_deadline = pending.values().min().copied();

        tokio::select! {
            event = events.recv() => match event {
                Ok(QuotationEvent::Updated { id, .. }) => {
                    pending.insert(id, Instant::now() + debounce);
                }
                Ok(QuotationEvent::Deleted { id }) => {
                    pending.remove(&id);
                    if let Err(e) = sink.delete(id).await {
                        error!(quotation_id = %id, error = ?e, "Failed to remove snapshot");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Missed events may hide edits; schedule everything.
                    warn!(skipped, "Autosave lagged behind change events");
                    let deadline = Instant::now() + debounce;
                    let (all, _) = store.list(0, usize::MAX);
                    for summary in all {
                        pending.insert(summary.id, deadline);
                    }
                }
                Err(RecvError::Closed) => break,
            },
            _ = sleep_until(next_deadline.unwrap_or_else(Instant::now)), if next_deadline.is_some() => {
                let now = Instant::now();
                let due: Vec<Uuid> = pending
                    .iter()
                    .filter(|(_, deadline)| **deadline <= now)
                    .map(|(id, _)| *id)
                    .collect();
                for id in due {
                    pending.remove(&id);
                    save(&store, sink.as_ref(), id).await;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    for id in pending.into_keys() {
        save(&store, sink.as_ref(), id).await;
    }
    debug!("Autosave stopped");
}

async fn save(store: &QuotationStore, sink: &dyn SnapshotSink, id: Uuid) {
    let Ok(quotation) = store.get(id) else {
        return;
    };
    let revision = quotation.revision;
    if let Err(e) = sink.save(quotation).await {
        error!(quotation_id = %id, revision, error = ?e, "Autosave failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildingType, CreateQuotationRequest, Customer};
    use parking_lot::Mutex;
    use tokio::time::sleep;

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<(Uuid, u64)>>,
        deleted: Mutex<Vec<Uuid>>,
    }

    impl SnapshotSink for Arc<RecordingSink> {
        fn save(&self, quotation: Quotation) -> BoxFuture<'static, Result<()>> {
            self.saved.lock().push((quotation.id, quotation.revision));
            async { Ok(()) }.boxed()
        }

        fn delete(&self, id: Uuid) -> BoxFuture<'static, Result<()>> {
            self.deleted.lock().push(id);
            async { Ok(()) }.boxed()
        }
    }

    fn request() -> CreateQuotationRequest {
        CreateQuotationRequest {
            title: "Autotalli".to_string(),
            customer: Customer::default(),
            site_address: None,
            building_type: BuildingType::Garage,
            notes: None,
        }
    }

    fn setup() -> (QuotationStore, Arc<RecordingSink>, Autosave) {
        let store = QuotationStore::new(64);
        let recorder = Arc::new(RecordingSink::default());
        let autosave = Autosave::spawn(
            store.clone(),
            Arc::new(recorder.clone()),
            Duration::from_millis(1500),
        );
        (store, recorder, autosave)
    }

    #[tokio::test(start_paused = true)]
    async fn saves_once_after_quiet_period() {
        let (store, recorder, _autosave) = setup();
        let q = store.create(request());

        for _ in 0..3 {
            sleep(Duration::from_millis(1000)).await;
            store
                .update(q.id, |q| q.add_element_section("Seinät".to_string()))
                .unwrap();
        }
        sleep(Duration::from_millis(1000)).await;
        assert!(recorder.saved.lock().is_empty());

        sleep(Duration::from_millis(600)).await;
        assert_eq!(recorder.saved.lock().as_slice(), &[(q.id, 3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn deleted_quotation_is_not_saved() {
        let (store, recorder, _autosave) = setup();
        let q = store.create(request());
        store.delete(q.id).unwrap();

        sleep(Duration::from_millis(2000)).await;
        assert!(recorder.saved.lock().is_empty());
        assert_eq!(recorder.deleted.lock().as_slice(), &[q.id]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_pending() {
        let (store, recorder, autosave) = setup();
        let q = store.create(request());
        tokio::task::yield_now().await;

        autosave.shutdown().await;
        assert_eq!(recorder.saved.lock().as_slice(), &[(q.id, 0)]);
    }

    #[tokio::test]
    async fn directory_sink_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let store = QuotationStore::new(16);
        let first = store.create(request());
        let second = store.create(request());

        sink.save(first.clone()).await.unwrap();
        sink.save(second.clone()).await.unwrap();
        tokio::fs::write(dir.path().join("broken.json"), "{ not json")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "ignored")
            .await
            .unwrap();

        let mut ids: Vec<Uuid> = load_snapshots(dir.path())
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        ids.sort();
        let mut expected = vec![first.id, second.id];
        expected.sort();
        assert_eq!(ids, expected);

        sink.delete(first.id).await.unwrap();
        sink.delete(first.id).await.unwrap();
        let restored = load_snapshots(dir.path()).await.unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].id, second.id);
        assert_eq!(restored[0].title, second.title);
    }

    #[tokio::test]
    async fn missing_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let restored = load_snapshots(&dir.path().join("absent")).await.unwrap();
        assert!(restored.is_empty());
    }

    #[tokio::test]
    async fn deleted_quotation_is_not_restored() {
        let dir = tempfile::tempdir().unwrap();
        let store = QuotationStore::new(16);
        let autosave = Autosave::spawn(
            store.clone(),
            Arc::new(DirectorySink::new(dir.path())),
            Duration::from_millis(20),
        );

        let q = store.create(request());
        sleep(Duration::from_millis(300)).await;
        assert!(dir.path().join(format!("{}.json", q.id)).exists());

        store.delete(q.id).unwrap();
        sleep(Duration::from_millis(300)).await;
        autosave.shutdown().await;

        assert!(load_snapshots(dir.path()).await.unwrap().is_empty());
    }
}

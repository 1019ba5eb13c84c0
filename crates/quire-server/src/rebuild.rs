//! Debounced, mutually exclusive rebuilds.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

use quire_static::{BuildError, SiteBuilder};

use crate::watcher::WatchEvent;

/// Something that can rebuild the site. Runs on a blocking thread.
pub trait Rebuild: Send + Sync + 'static {
    type Error: Display + Send + 'static;

    fn rebuild(&self) -> Result<(), Self::Error>;
}

impl Rebuild for SiteBuilder {
    type Error = BuildError;

    fn rebuild(&self) -> Result<(), BuildError> {
        let result = self.build()?;
        tracing::info!(
            "Rebuilt {} pages in {}ms",
            result.pages,
            result.duration_ms
        );
        Ok(())
    }
}

/// What happened to a rebuild request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The caller ran the rebuild (and any rebuild queued meanwhile)
    Ran,
    /// A rebuild was already running; one more will follow it
    Queued,
}

/// Lets at most one rebuild run at a time, with at most one queued behind it.
pub struct RebuildGate<R> {
    rebuilder: Arc<R>,
    busy: AtomicBool,
    pending: AtomicBool,
}

impl<R: Rebuild> RebuildGate<R> {
    pub fn new(rebuilder: Arc<R>) -> Self {
        Self {
            rebuilder,
            busy: AtomicBool::new(false),
            pending: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Request a rebuild.
    ///
    /// Errors are logged and swallowed so a broken source never takes the
    /// server down.
    pub async fn trigger(&self) -> Trigger {
        if !self.acquire() {
            self.pending.store(true, Ordering::SeqCst);

            // The runner may have released the gate before seeing the flag.
            if !self.acquire() {
                tracing::debug!("Rebuild already running, queued one more");
                return Trigger::Queued;
            }
        }

        loop {
            self.pending.store(false, Ordering::SeqCst);
            self.run_once().await;
            self.busy.store(false, Ordering::SeqCst);

            // Someone asked while we were busy. If another caller grabbed the
            // gate in the meantime it will cover the request.
            if !self.pending.load(Ordering::SeqCst) || !self.acquire() {
                break;
            }
        }

        Trigger::Ran
    }

    fn acquire(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    async fn run_once(&self) {
        tracing::info!("Rebuilding...");

        let rebuilder = Arc::clone(&self.rebuilder);
        match tokio::task::spawn_blocking(move || rebuilder.rebuild()).await {
            Ok(Ok(())) => tracing::info!("Rebuild completed"),
            Ok(Err(e)) => tracing::error!("Rebuild failed: {}", e),
            Err(e) => tracing::error!("Rebuild task panicked: {}", e),
        }
    }
}

/// Coalesce watch events into rebuilds.
///
/// Each event restarts a quiet period; when it runs out without further
/// events, one rebuild is requested through the gate. The request is spawned
/// so events keep being coalesced while a build runs. Returns when the event
/// channel closes.
pub async fn debounce_rebuilds<R: Rebuild>(
    mut events: UnboundedReceiver<WatchEvent>,
    gate: Arc<RebuildGate<R>>,
    quiet: Duration,
) {
    while let Some(event) = events.recv().await {
        log_event(&event);

        let mut closed = false;
        let sleep = tokio::time::sleep(quiet);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => break,
                next = events.recv() => match next {
                    Some(event) => {
                        log_event(&event);
                        sleep.as_mut().reset(Instant::now() + quiet);
                    }
                    None => {
                        closed = true;
                        break;
                    }
                },
            }
        }

        let gate = Arc::clone(&gate);
        tokio::spawn(async move {
            gate.trigger().await;
        });

        if closed {
            break;
        }
    }
}

fn log_event(event: &WatchEvent) {
    match event {
        WatchEvent::Added(path) => tracing::info!("File added: {}", path.display()),
        WatchEvent::Changed(path) => tracing::info!("File changed: {}", path.display()),
        WatchEvent::Removed(path) => tracing::info!("File deleted: {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct Counting {
        runs: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl Rebuild for Counting {
        type Error = String;

        fn rebuild(&self) -> Result<(), String> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.runs.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                Err("boom".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn changed(name: &str) -> WatchEvent {
        WatchEvent::Changed(PathBuf::from(name))
    }

    #[tokio::test]
    async fn burst_of_events_triggers_one_rebuild() {
        let counting = Arc::new(Counting::default());
        let gate = Arc::new(RebuildGate::new(Arc::clone(&counting)));
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(debounce_rebuilds(rx, gate, Duration::from_millis(150)));

        for i in 0..5 {
            tx.send(changed(&format!("docs/page{i}.md"))).unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counting.runs.load(Ordering::SeqCst), 1);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn separated_bursts_rebuild_separately() {
        let counting = Arc::new(Counting::default());
        let gate = Arc::new(RebuildGate::new(Arc::clone(&counting)));
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(debounce_rebuilds(rx, gate, Duration::from_millis(50)));

        tx.send(changed("docs/a.md")).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(changed("docs/b.md")).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(counting.runs.load(Ordering::SeqCst), 2);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn triggers_during_a_build_queue_exactly_one_more() {
        let counting = Arc::new(Counting {
            delay: Duration::from_millis(200),
            ..Default::default()
        });
        let gate = Arc::new(RebuildGate::new(Arc::clone(&counting)));

        let first = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.trigger().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(gate.is_busy());

        assert_eq!(gate.trigger().await, Trigger::Queued);
        assert_eq!(gate.trigger().await, Trigger::Queued);
        assert_eq!(first.await.unwrap(), Trigger::Ran);

        assert_eq!(counting.runs.load(Ordering::SeqCst), 2);
        assert_eq!(counting.max_active.load(Ordering::SeqCst), 1);
        assert!(!gate.is_busy());
    }

    /// Records the highest request number visible when each build starts.
    #[derive(Default)]
    struct Coverage {
        requested: AtomicUsize,
        covered: AtomicUsize,
    }

    impl Rebuild for Coverage {
        type Error = String;

        fn rebuild(&self) -> Result<(), String> {
            let seen = self.requested.load(Ordering::SeqCst);
            self.covered.fetch_max(seen, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_triggers_never_drop_the_last_request() {
        const CALLERS: usize = 16;

        for _ in 0..50 {
            let coverage = Arc::new(Coverage::default());
            let gate = Arc::new(RebuildGate::new(Arc::clone(&coverage)));

            let callers: Vec<_> = (0..CALLERS)
                .map(|_| {
                    let gate = Arc::clone(&gate);
                    let coverage = Arc::clone(&coverage);
                    tokio::spawn(async move {
                        coverage.requested.fetch_add(1, Ordering::SeqCst);
                        gate.trigger().await
                    })
                })
                .collect();

            for caller in callers {
                caller.await.unwrap();
            }

            // Every request, the last included, was seen by a build that
            // started after it.
            assert_eq!(coverage.covered.load(Ordering::SeqCst), CALLERS);
            assert!(!gate.is_busy());
        }
    }

    #[tokio::test]
    async fn failed_rebuild_releases_the_gate() {
        let counting = Arc::new(Counting {
            fail: true,
            ..Default::default()
        });
        let gate = RebuildGate::new(Arc::clone(&counting));

        assert_eq!(gate.trigger().await, Trigger::Ran);
        assert!(!gate.is_busy());
        assert_eq!(gate.trigger().await, Trigger::Ran);

        assert_eq!(counting.runs.load(Ordering::SeqCst), 2);
    }
}

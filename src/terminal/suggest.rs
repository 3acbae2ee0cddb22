use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::inference::{self, Completer};

#[derive(Debug, Default)]
struct InputState {
    revision: u64,
    text: String,
    closed: bool,
}

/// Latest demo input, versioned so suggestions can be matched to it.
#[derive(Debug, Default)]
pub struct InputCell {
    state: Mutex<InputState>,
    changed: Condvar,
}

impl InputCell {
    fn lock(&self) -> MutexGuard<'_, InputState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores new text and returns its revision.
    pub fn publish(&self, text: &str) -> u64 {
        let mut state = self.lock();
        state.revision += 1;
        state.text = text.to_string();
        state.revision
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    pub fn snapshot(&self) -> (u64, String) {
        let state = self.lock();
        (state.revision, state.text.clone())
    }

    pub fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_all();
    }

    /// Sleeps for `interval` unless closed first. Returns false once closed.
    fn wait_interval(&self, interval: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .changed
            .wait_timeout_while(state, interval, |s| !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        !state.closed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub revision: u64,
    pub text: String,
}

/// Background thread that completes the latest input once per interval.
pub struct SuggestionWorker {
    cell: Arc<InputCell>,
    latest: Arc<Mutex<Option<Suggestion>>>,
    handle: Option<JoinHandle<()>>,
}

impl SuggestionWorker {
    pub fn spawn(
        cell: Arc<InputCell>,
        completer: Arc<dyn Completer>,
        subject: String,
        interval: Duration,
    ) -> Self {
        let latest = Arc::new(Mutex::new(None));
        let handle = {
            let cell = cell.clone();
            let latest = latest.clone();
            thread::spawn(move || {
                let mut done: Option<u64> = None;
                while cell.wait_interval(interval) {
                    let (revision, text) = cell.snapshot();
                    if done == Some(revision) || text.trim().is_empty() {
                        continue;
                    }
                    match inference::suggest(completer.as_ref(), &subject, &text) {
                        Ok(text) => {
                            *latest.lock().unwrap_or_else(PoisonError::into_inner) =
                                Some(Suggestion { revision, text });
                        }
                        Err(e) => log::warn!("suggestion failed: {e:#}"),
                    }
                    done = Some(revision);
                }
                log::debug!("suggestion worker stopped");
            })
        };
        Self {
            cell,
            latest,
            handle: Some(handle),
        }
    }

    /// The latest suggestion, only if it was computed for `revision`.
    pub fn fresh(&self, revision: u64) -> Option<String> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|s| s.revision == revision)
            .map(|s| s.text.clone())
    }
}

impl Drop for SuggestionWorker {
    fn drop(&mut self) {
        self.cell.close();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::testing::EchoCompleter;
    use std::time::Instant;

    fn wait_for(worker: &SuggestionWorker, revision: u64) -> Option<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(s) = worker.fresh(revision) {
                return Some(s);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn revisions_increase_per_publish() {
        let cell = InputCell::default();
        assert_eq!(cell.publish("a"), 1);
        assert_eq!(cell.publish("ab"), 2);
        assert_eq!(cell.snapshot(), (2, "ab".to_string()));
    }

    #[test]
    fn suggestion_is_tied_to_its_revision() {
        let cell = Arc::new(InputCell::default());
        let worker = SuggestionWorker::spawn(
            cell.clone(),
            Arc::new(EchoCompleter::default()),
            "Lunch".into(),
            Duration::from_millis(200),
        );

        let first = cell.publish("see you at noon ");
        assert_eq!(wait_for(&worker, first).as_deref(), Some("NOON"));

        let second = cell.publish("see you at noon tomorrow ");
        assert_eq!(worker.fresh(second), None);
        assert_eq!(wait_for(&worker, second).as_deref(), Some("TOMORROW"));
        assert_eq!(worker.fresh(first), None);
    }

    #[test]
    fn blank_input_is_never_sent() {
        let cell = Arc::new(InputCell::default());
        let completer = Arc::new(EchoCompleter::default());
        let worker = SuggestionWorker::spawn(
            cell.clone(),
            completer.clone(),
            "Lunch".into(),
            Duration::from_millis(5),
        );
        let blank = cell.publish("   ");
        thread::sleep(Duration::from_millis(60));
        assert_eq!(worker.fresh(blank), None);
        drop(worker);
        assert!(completer.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn drop_wakes_a_sleeping_worker() {
        let cell = Arc::new(InputCell::default());
        let worker = SuggestionWorker::spawn(
            cell.clone(),
            Arc::new(EchoCompleter::default()),
            String::new(),
            Duration::from_secs(600),
        );
        let started = Instant::now();
        drop(worker);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}

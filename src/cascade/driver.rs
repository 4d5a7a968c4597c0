//! Async driver that runs [`CascadeState`] effects on Tokio.

use super::callbacks::Callbacks;
use super::selection::Selection;
use super::state::{Action, CascadeState, Effect, FetchId, LevelView};
use super::tracker::FetchTracker;
use crate::error::FetchError;
use crate::region::{Level, Region, RegionQuery};
use crate::source::RegionSource;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Result of a user selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The code was in the loaded list; the owner callback fired.
    Resolved(Region),
    /// The code is not (yet) in the loaded list; nothing happened.
    Unresolved,
}

/// A mounted cascade.
///
/// The owner calls [`Cascade::select`] for user input and drives fetch
/// completions with [`Cascade::next_event`], [`Cascade::try_pump`] or
/// [`Cascade::settle`]. Dropping the cascade cancels every in-flight fetch.
pub struct Cascade<S> {
    state: CascadeState,
    source: Arc<S>,
    callbacks: Callbacks,
    tracker: FetchTracker,
    results_tx: mpsc::UnboundedSender<Action>,
    results_rx: mpsc::UnboundedReceiver<Action>,
}

impl<S: RegionSource> Cascade<S> {
    /// Mount a cascade and start loading provinces (and the lists under any
    /// preselected codes).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(source: Arc<S>, selection: Selection, callbacks: Callbacks) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let mut cascade = Self {
            state: CascadeState::new(selection),
            source,
            callbacks,
            tracker: FetchTracker::new(),
            results_tx,
            results_rx,
        };
        cascade.dispatch(Action::Mount);
        cascade
    }

    pub fn state(&self) -> &CascadeState {
        &self.state
    }

    pub fn selection(&self) -> &Selection {
        self.state.selection()
    }

    pub fn views(&self) -> Vec<LevelView> {
        self.state.views()
    }

    /// Handle a user selection of `code` at `level`.
    pub fn select(&mut self, level: Level, code: &str) -> SelectOutcome {
        let effects = self.state.dispatch(Action::OptionSelected {
            level,
            code: code.to_string(),
        });
        let resolved = effects.iter().find_map(|effect| match effect {
            Effect::Notify {
                level: notified,
                code,
                name,
            } if *notified == level => Some(Region::new(code.clone(), name.clone(), level)),
            _ => None,
        });
        self.run(effects);

        match resolved {
            Some(region) => SelectOutcome::Resolved(region),
            None => SelectOutcome::Unresolved,
        }
    }

    /// Retry loading `level` under the current parent selection.
    pub fn reload(&mut self, level: Level) {
        self.dispatch(Action::Reload { level });
    }

    /// Apply an action and carry out its effects.
    pub fn dispatch(&mut self, action: Action) {
        let effects = self.state.dispatch(action);
        self.run(effects);
    }

    /// Wait for the next fetch result and apply it.
    ///
    /// Returns `false` without waiting when no fetch is pending.
    pub async fn next_event(&mut self) -> bool {
        if !self.state.has_pending() {
            return false;
        }
        match self.results_rx.recv().await {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    /// Apply every fetch result that has already arrived, without waiting.
    pub fn try_pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.results_rx.try_recv() {
            self.dispatch(action);
            applied += 1;
        }
        applied
    }

    /// Wait until no fetch is pending.
    pub async fn settle(&mut self) {
        while self.next_event().await {}
    }

    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch { fetch_id, query } => self.spawn_fetch(fetch_id, query),
                Effect::Cancel { level } => self.tracker.cancel(level),
                Effect::Notify { level, code, name } => {
                    self.callbacks.notify(level, &code, &name);
                }
            }
        }
    }

    fn spawn_fetch(&mut self, fetch_id: FetchId, query: RegionQuery) {
        let level = query.level;
        let token = self.tracker.start(level);
        let source = Arc::clone(&self.source);
        let report = FetchReport {
            level,
            fetch_id,
            results: Some(self.results_tx.clone()),
        };

        log::debug!(
            target: "wilayah::cascade",
            "Fetching {} options (fetch {}, parent {:?})",
            level,
            fetch_id,
            query.parent
        );

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    log::trace!(
                        target: "wilayah::cascade",
                        "Fetch {} for {} cancelled",
                        fetch_id,
                        level
                    );
                    report.disarm();
                }
                result = source.fetch(&query) => {
                    report.send(match result {
                        Ok(regions) => Action::OptionsLoaded { level, fetch_id, regions },
                        Err(error) => Action::FetchFailed { level, fetch_id, error },
                    });
                }
            }
        });
    }
}

/// Delivers the outcome of one spawned fetch.
///
/// If the task ends without a result (the source panicked), dropping the
/// report sends a failure so the level does not stay pending forever.
struct FetchReport {
    level: Level,
    fetch_id: FetchId,
    results: Option<mpsc::UnboundedSender<Action>>,
}

impl FetchReport {
    fn send(mut self, action: Action) {
        if let Some(results) = self.results.take() {
            // The receiver is gone once the cascade is dropped.
            let _ = results.send(action);
        }
    }

    fn disarm(mut self) {
        self.results = None;
    }
}

impl Drop for FetchReport {
    fn drop(&mut self) {
        if let Some(results) = self.results.take() {
            log::warn!(
                target: "wilayah::cascade",
                "Fetch {} for {} ended without a result",
                self.fetch_id,
                self.level
            );
            let _ = results.send(Action::FetchFailed {
                level: self.level,
                fetch_id: self.fetch_id,
                error: FetchError::transport("region source ended without a result"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_helpers::FakeSource;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    fn provinces() -> Vec<Region> {
        vec![
            Region::new("32", "Jawa Barat", Level::Province),
            Region::new("31", "DKI Jakarta", Level::Province),
        ]
    }

    type Seen = Arc<Mutex<Vec<(Level, String, String)>>>;

    fn recording_callbacks() -> (Callbacks, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let mut callbacks = Callbacks::new();
        for level in Level::ALL {
            let sink = Arc::clone(&seen);
            callbacks = callbacks.on(level, move |code, name| {
                sink.lock()
                    .unwrap()
                    .push((level, code.to_string(), name.to_string()));
            });
        }
        (callbacks, seen)
    }

    #[tokio::test]
    async fn mount_loads_provinces() {
        let source = Arc::new(FakeSource::new().answer(RegionQuery::provinces(), provinces()));
        let mut cascade = Cascade::mount(Arc::clone(&source), Selection::empty(), Callbacks::new());
        cascade.settle().await;

        assert_eq!(cascade.state().options(Level::Province), provinces().as_slice());
        assert_eq!(source.calls(), vec![RegionQuery::provinces()]);
        for level in [Level::District, Level::City, Level::Village] {
            assert!(cascade.state().is_disabled(level));
            assert!(cascade.state().options(level).is_empty());
        }
    }

    #[tokio::test]
    async fn select_fires_one_callback_and_loads_children() {
        let districts = vec![Region::new("3201", "Kabupaten Bogor", Level::District)];
        let source = Arc::new(
            FakeSource::new()
                .answer(RegionQuery::provinces(), provinces())
                .answer(RegionQuery::children(Level::District, "32"), districts.clone()),
        );
        let (callbacks, seen) = recording_callbacks();
        let mut cascade = Cascade::mount(source, Selection::empty(), callbacks);
        cascade.settle().await;

        let outcome = cascade.select(Level::Province, "32");
        assert_eq!(
            outcome,
            SelectOutcome::Resolved(Region::new("32", "Jawa Barat", Level::Province))
        );
        cascade.settle().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(Level::Province, "32".to_string(), "Jawa Barat".to_string())]
        );
        assert_eq!(cascade.state().options(Level::District), districts.as_slice());
    }

    #[tokio::test]
    async fn unknown_code_fires_nothing() {
        let source = Arc::new(FakeSource::new().answer(RegionQuery::provinces(), provinces()));
        let (callbacks, seen) = recording_callbacks();
        let mut cascade = Cascade::mount(Arc::clone(&source), Selection::empty(), callbacks);
        cascade.settle().await;

        assert_eq!(cascade.select(Level::Province, "99"), SelectOutcome::Unresolved);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(source.hits(), 1);
    }

    #[tokio::test]
    async fn latest_parent_wins_even_when_older_response_is_slower() {
        let source = Arc::new(
            FakeSource::new()
                .answer(RegionQuery::provinces(), provinces())
                .answer_after(
                    RegionQuery::children(Level::District, "32"),
                    Duration::from_millis(200),
                    Ok(vec![Region::new("3201", "Kabupaten Bogor", Level::District)]),
                )
                .answer_after(
                    RegionQuery::children(Level::District, "31"),
                    Duration::from_millis(10),
                    Ok(vec![Region::new("3171", "Jakarta Selatan", Level::District)]),
                ),
        );
        let mut cascade = Cascade::mount(source, Selection::empty(), Callbacks::new());
        cascade.settle().await;

        cascade.select(Level::Province, "32");
        cascade.select(Level::Province, "31");
        cascade.settle().await;
        // Give the superseded fetch time to finish if it had not been cancelled.
        tokio::time::sleep(Duration::from_millis(250)).await;
        cascade.try_pump();

        assert_eq!(
            cascade.state().options(Level::District),
            &[Region::new("3171", "Jakarta Selatan", Level::District)]
        );
    }

    #[tokio::test]
    async fn failed_fetch_keeps_other_levels_working() {
        let source = Arc::new(
            FakeSource::new()
                .answer(RegionQuery::provinces(), provinces())
                .answer(
                    RegionQuery::children(Level::District, "32"),
                    vec![Region::new("3201", "Kabupaten Bogor", Level::District)],
                )
                .answer_after(
                    RegionQuery::children(Level::City, "3201"),
                    Duration::ZERO,
                    Err(FetchError::http(500, "fake")),
                ),
        );
        let mut cascade = Cascade::mount(source, Selection::empty(), Callbacks::new());
        cascade.settle().await;
        cascade.select(Level::Province, "32");
        cascade.settle().await;
        cascade.select(Level::District, "3201");
        cascade.settle().await;

        assert!(cascade.state().has_failed(Level::City));
        assert!(cascade.state().options(Level::City).is_empty());
        assert!(!cascade.state().is_disabled(Level::City));
        assert!(!cascade.state().is_disabled(Level::District));
        assert_eq!(cascade.state().options(Level::Province).len(), 2);
        assert!(matches!(
            cascade.select(Level::Province, "31"),
            SelectOutcome::Resolved(_)
        ));
    }

    #[tokio::test]
    async fn next_event_returns_false_when_idle() {
        let source = Arc::new(FakeSource::new().answer(RegionQuery::provinces(), provinces()));
        let mut cascade = Cascade::mount(source, Selection::empty(), Callbacks::new());
        assert!(cascade.next_event().await);
        assert!(!cascade.next_event().await);
    }

    #[tokio::test]
    async fn preselection_loads_every_enabled_level() {
        let source = Arc::new(
            FakeSource::new()
                .answer(RegionQuery::provinces(), provinces())
                .answer(
                    RegionQuery::children(Level::District, "32"),
                    vec![Region::new("3201", "Kabupaten Bogor", Level::District)],
                ),
        );
        let selection = Selection::from_codes(Some("32"), Some("3201"), None, None);
        let mut cascade = Cascade::mount(Arc::clone(&source), selection, Callbacks::new());
        cascade.settle().await;

        let queries = source.calls();
        assert_eq!(queries.len(), 3);
        assert!(queries.contains(&RegionQuery::children(Level::City, "3201")));
        assert_eq!(
            cascade.state().selected_region(Level::District).map(|r| r.name.as_str()),
            Some("Kabupaten Bogor")
        );
    }

    #[tokio::test]
    async fn deserialized_orphan_selection_mounts_like_an_empty_one() {
        let source = Arc::new(FakeSource::new().answer(RegionQuery::provinces(), provinces()));
        let selection: Selection = serde_json::from_str(r#"{"district":"3201"}"#).unwrap();
        let mut cascade = Cascade::mount(Arc::clone(&source), selection, Callbacks::new());
        cascade.settle().await;

        assert_eq!(source.calls(), vec![RegionQuery::provinces()]);
        assert_eq!(cascade.state().selected(Level::District), None);
        assert!(cascade.state().is_disabled(Level::City));
    }

    /// Panics on province queries, answers everything else with an empty list.
    struct PanickingSource;

    impl RegionSource for PanickingSource {
        fn fetch(
            &self,
            query: &RegionQuery,
        ) -> impl Future<Output = Result<Vec<Region>, FetchError>> + Send {
            let level = query.level;
            async move {
                assert_ne!(level, Level::Province, "region backend crashed");
                Ok(Vec::new())
            }
        }
    }

    #[tokio::test]
    async fn panicking_source_fails_the_level_instead_of_hanging() {
        let mut cascade = Cascade::mount(
            Arc::new(PanickingSource),
            Selection::empty(),
            Callbacks::new(),
        );
        tokio::time::timeout(Duration::from_secs(5), cascade.settle())
            .await
            .expect("settle should not hang");

        assert!(cascade.state().has_failed(Level::Province));
        assert!(!cascade.state().is_loading(Level::Province));
    }
}

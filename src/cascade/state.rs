//! Reducer for the cascade.
//!
//! `CascadeState::dispatch` is the only way the state changes. It never
//! performs I/O; instead it returns [`Effect`]s for the driver to carry out.

use super::selection::Selection;
use crate::error::FetchError;
use crate::region::{Level, Region, RegionQuery};
use serde::Serialize;

/// Identifies one issued fetch. Strictly increasing within a cascade.
pub type FetchId = u64;

/// Events the cascade reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Initial mount: load provinces and the lists under any preselection.
    Mount,
    /// The user picked `code` at `level`.
    OptionSelected { level: Level, code: String },
    /// `level` now holds `code` (empty clears it). Descendants are reset and
    /// the child list is refetched. A code missing from the loaded list for
    /// `level` is ignored.
    ParentChanged { level: Level, code: String },
    /// A fetch finished successfully.
    OptionsLoaded {
        level: Level,
        fetch_id: FetchId,
        regions: Vec<Region>,
    },
    /// A fetch failed.
    FetchFailed {
        level: Level,
        fetch_id: FetchId,
        error: FetchError,
    },
    /// Retry the fetch for `level` under the current parent selection.
    Reload { level: Level },
}

/// Work the driver must perform after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch { fetch_id: FetchId, query: RegionQuery },
    /// The pending fetch for `level` is obsolete.
    Cancel { level: Level },
    /// Tell the owner that `level` now holds `(code, name)`.
    Notify { level: Level, code: String, name: String },
}

#[derive(Debug, Clone, Default)]
struct LevelState {
    options: Vec<Region>,
    pending: Option<FetchId>,
    failed: bool,
}

/// Snapshot of one level for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelView {
    pub level: Level,
    pub selected: Option<String>,
    pub selected_name: Option<String>,
    pub disabled: bool,
    pub loading: bool,
    pub failed: bool,
    pub options: Vec<Region>,
}

#[derive(Debug, Clone)]
pub struct CascadeState {
    selection: Selection,
    levels: [LevelState; 4],
    last_fetch_id: FetchId,
}

impl Default for CascadeState {
    fn default() -> Self {
        Self::new(Selection::empty())
    }
}

impl CascadeState {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            levels: Default::default(),
            last_fetch_id: 0,
        }
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Mount => self.mount(),
            Action::OptionSelected { level, code } => self.option_selected(level, &code),
            Action::ParentChanged { level, code } => self.parent_changed(level, &code),
            Action::OptionsLoaded {
                level,
                fetch_id,
                regions,
            } => self.options_loaded(level, fetch_id, regions),
            Action::FetchFailed {
                level,
                fetch_id,
                error,
            } => {
                self.fetch_failed(level, fetch_id, &error);
                Vec::new()
            }
            Action::Reload { level } => self.reload(level),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected(&self, level: Level) -> Option<&str> {
        self.selection.get(level)
    }

    /// The selected region at `level`, if its code is in the loaded list.
    pub fn selected_region(&self, level: Level) -> Option<&Region> {
        let code = self.selection.get(level)?;
        self.find(level, code)
    }

    pub fn options(&self, level: Level) -> &[Region] {
        &self.levels[level.index()].options
    }

    /// A selector is disabled while its parent has no selection.
    pub fn is_disabled(&self, level: Level) -> bool {
        level
            .parent()
            .is_some_and(|parent| !self.selection.is_set(parent))
    }

    pub fn is_loading(&self, level: Level) -> bool {
        self.levels[level.index()].pending.is_some()
    }

    /// Whether the most recent fetch for `level` failed.
    pub fn has_failed(&self, level: Level) -> bool {
        self.levels[level.index()].failed
    }

    pub fn pending_fetch(&self, level: Level) -> Option<FetchId> {
        self.levels[level.index()].pending
    }

    pub fn has_pending(&self) -> bool {
        self.levels.iter().any(|l| l.pending.is_some())
    }

    pub fn view(&self, level: Level) -> LevelView {
        let state = &self.levels[level.index()];
        LevelView {
            level,
            selected: self.selected(level).map(str::to_string),
            selected_name: self.selected_region(level).map(|r| r.name.clone()),
            disabled: self.is_disabled(level),
            loading: state.pending.is_some(),
            failed: state.failed,
            options: state.options.clone(),
        }
    }

    pub fn views(&self) -> Vec<LevelView> {
        Level::ALL.into_iter().map(|level| self.view(level)).collect()
    }

    fn find(&self, level: Level, code: &str) -> Option<&Region> {
        self.levels[level.index()]
            .options
            .iter()
            .find(|region| region.code == code)
    }

    fn mount(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        for level in Level::ALL {
            if !self.is_disabled(level) {
                effects.extend(self.fetch(level));
            }
        }
        effects
    }

    fn option_selected(&mut self, level: Level, code: &str) -> Vec<Effect> {
        if self.is_disabled(level) {
            log::debug!(
                target: "wilayah::cascade",
                "Ignoring {} selection while the selector is disabled",
                level
            );
            return Vec::new();
        }

        let Some(region) = self.find(level, code) else {
            log::debug!(
                target: "wilayah::cascade",
                "Selected {} code '{}' is not in the loaded list",
                level,
                code
            );
            return Vec::new();
        };

        let mut effects = vec![Effect::Notify {
            level,
            code: region.code.clone(),
            name: region.name.clone(),
        }];

        if self.selection.get(level) != Some(code) {
            effects.extend(self.parent_changed(level, code));
        } else if let Some(child) = level.child()
            && self.has_failed(child)
            && !self.is_loading(child)
        {
            // Same parent again: the only effect is retrying a failed child list.
            effects.extend(self.fetch(child));
        }

        effects
    }

    fn parent_changed(&mut self, level: Level, code: &str) -> Vec<Effect> {
        if self.is_disabled(level) {
            log::debug!(
                target: "wilayah::cascade",
                "Ignoring {} change without a parent selection",
                level
            );
            return Vec::new();
        }
        if !code.is_empty() && self.find(level, code).is_none() {
            log::debug!(
                target: "wilayah::cascade",
                "Ignoring {} change to '{}', which is not in the loaded list",
                level,
                code
            );
            return Vec::new();
        }

        let mut effects = Vec::new();

        if code.is_empty() {
            self.selection.clear_from(level);
        } else {
            self.selection.set(level, code);
            for descendant in level.descendants() {
                self.selection.clear_from(*descendant);
            }
        }

        for descendant in level.descendants() {
            effects.extend(self.reset_level(*descendant));
        }

        if !code.is_empty()
            && let Some(child) = level.child()
        {
            effects.extend(self.fetch(child));
        }

        effects
    }

    fn options_loaded(&mut self, level: Level, fetch_id: FetchId, regions: Vec<Region>) -> Vec<Effect> {
        let state = &mut self.levels[level.index()];
        if state.pending != Some(fetch_id) {
            log::debug!(
                target: "wilayah::cascade",
                "Dropping superseded {} list (fetch {})",
                level,
                fetch_id
            );
            return Vec::new();
        }

        state.pending = None;
        state.failed = false;
        state.options = regions;

        let mut effects = Vec::new();
        if let Some(code) = self.selection.get(level)
            && self.find(level, code).is_none()
        {
            log::info!(
                target: "wilayah::cascade",
                "Selected {} '{}' is not offered under the current parent; clearing it",
                level,
                code
            );
            self.selection.clear_from(level);
            for descendant in level.descendants() {
                effects.extend(self.reset_level(*descendant));
            }
        }
        effects
    }

    fn fetch_failed(&mut self, level: Level, fetch_id: FetchId, error: &FetchError) {
        let state = &mut self.levels[level.index()];
        if state.pending != Some(fetch_id) {
            log::debug!(
                target: "wilayah::cascade",
                "Ignoring failure of superseded {} fetch {}: {}",
                level,
                fetch_id,
                error
            );
            return;
        }

        state.pending = None;
        state.failed = true;
        log::warn!(
            target: "wilayah::cascade",
            "Failed to load {} options, keeping {} previous entries: {}",
            level,
            state.options.len(),
            error
        );
    }

    fn reload(&mut self, level: Level) -> Vec<Effect> {
        if self.is_disabled(level) {
            return Vec::new();
        }
        self.fetch(level).into_iter().collect()
    }

    /// Empty a level's list and forget any fetch issued for it.
    fn reset_level(&mut self, level: Level) -> Option<Effect> {
        let state = &mut self.levels[level.index()];
        state.options.clear();
        state.failed = false;
        state.pending.take().map(|_| Effect::Cancel { level })
    }

    /// Issue a fetch for `level` under the current parent selection.
    fn fetch(&mut self, level: Level) -> Option<Effect> {
        let parent = level.parent().and_then(|p| self.selection.get(p));
        let query = RegionQuery::for_level(level, parent).ok()?;

        self.last_fetch_id += 1;
        let fetch_id = self.last_fetch_id;
        self.levels[level.index()].pending = Some(fetch_id);
        Some(Effect::Fetch { fetch_id, query })
    }
}

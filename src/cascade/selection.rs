use crate::region::Level;
use serde::{Deserialize, Serialize};

/// The selected code at each level.
///
/// A level is only ever set when its parent is set. Deserialized input goes
/// through [`Selection::from_codes`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCodes")]
pub struct Selection {
    #[serde(skip_serializing_if = "Option::is_none")]
    province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    village: Option<String>,
}

/// Codes as written by a caller, before normalisation.
#[derive(Deserialize)]
struct StoredCodes {
    #[serde(default)]
    province: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    village: Option<String>,
}

impl From<StoredCodes> for Selection {
    fn from(codes: StoredCodes) -> Self {
        Selection::from_codes(
            codes.province.as_deref(),
            codes.district.as_deref(),
            codes.city.as_deref(),
            codes.village.as_deref(),
        )
    }
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a selection from caller-supplied codes, e.g. the stored region
    /// of an existing property.
    ///
    /// Empty strings count as unset. A code whose parent is unset is dropped
    /// together with everything beneath it.
    pub fn from_codes(
        province: Option<&str>,
        district: Option<&str>,
        city: Option<&str>,
        village: Option<&str>,
    ) -> Self {
        let mut selection = Self::empty();
        for (level, code) in Level::ALL.into_iter().zip([province, district, city, village]) {
            let Some(code) = code.filter(|c| !c.is_empty()) else {
                break;
            };
            if level.parent().is_some_and(|parent| !selection.is_set(parent)) {
                break;
            }
            selection.set(level, code);
        }

        for (level, code) in Level::ALL.into_iter().zip([province, district, city, village]) {
            if code.is_some_and(|c| !c.is_empty()) && !selection.is_set(level) {
                log::debug!(
                    target: "wilayah::cascade",
                    "Ignoring preselected {} code without a parent selection",
                    level
                );
            }
        }

        selection
    }

    /// Chainable form of [`Selection::from_codes`] for one level at a time.
    ///
    /// Changing a level clears everything beneath it.
    pub fn with(mut self, level: Level, code: impl Into<String>) -> Self {
        let code = code.into();
        let parent_ok = level.parent().is_none_or(|parent| self.is_set(parent));
        if parent_ok && !code.is_empty() && self.get(level) != Some(code.as_str()) {
            self.clear_from(level);
            self.set(level, code);
        }
        self
    }

    pub fn get(&self, level: Level) -> Option<&str> {
        self.slot(level).as_deref()
    }

    pub fn is_set(&self, level: Level) -> bool {
        self.slot(level).is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_set(Level::Province)
    }

    /// The deepest level that has a selection.
    pub fn deepest(&self) -> Option<Level> {
        Level::ALL.into_iter().rev().find(|level| self.is_set(*level))
    }

    pub(crate) fn set(&mut self, level: Level, code: impl Into<String>) {
        *self.slot_mut(level) = Some(code.into());
    }

    /// Clear `level` and every level beneath it.
    pub(crate) fn clear_from(&mut self, level: Level) {
        *self.slot_mut(level) = None;
        for descendant in level.descendants() {
            *self.slot_mut(*descendant) = None;
        }
    }

    fn slot(&self, level: Level) -> &Option<String> {
        match level {
            Level::Province => &self.province,
            Level::District => &self.district,
            Level::City => &self.city,
            Level::Village => &self.village,
        }
    }

    fn slot_mut(&mut self, level: Level) -> &mut Option<String> {
        match level {
            Level::Province => &mut self.province,
            Level::District => &mut self.district,
            Level::City => &mut self.city,
            Level::Village => &mut self.village,
        }
    }
}

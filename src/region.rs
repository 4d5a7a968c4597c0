//! Administrative region model.
//!
//! Regions form a fixed four-level hierarchy (province → district → city →
//! village). A region never stores its parent; the relationship only exists
//! through the query used to fetch it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of entries requested per level.
pub const MAX_PAGE_SIZE: usize = 100;

/// One level of the administrative hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Province,
    District,
    City,
    Village,
}

impl Level {
    /// All levels, top of the hierarchy first.
    pub const ALL: [Level; 4] = [Level::Province, Level::District, Level::City, Level::Village];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Province => "province",
            Level::District => "district",
            Level::City => "city",
            Level::Village => "village",
        }
    }

    /// Position in [`Level::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn parent(self) -> Option<Level> {
        match self {
            Level::Province => None,
            Level::District => Some(Level::Province),
            Level::City => Some(Level::District),
            Level::Village => Some(Level::City),
        }
    }

    pub fn child(self) -> Option<Level> {
        match self {
            Level::Province => Some(Level::District),
            Level::District => Some(Level::City),
            Level::City => Some(Level::Village),
            Level::Village => None,
        }
    }

    /// Every level strictly below this one, nearest first.
    pub fn descendants(self) -> &'static [Level] {
        &Level::ALL[self.index() + 1..]
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "province" => Ok(Level::Province),
            "district" => Ok(Level::District),
            "city" => Ok(Level::City),
            "village" => Ok(Level::Village),
            other => Err(format!(
                "unknown level '{}' (expected province, district, city or village)",
                other
            )),
        }
    }
}

/// A node in the administrative hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub code: String,
    pub name: String,
    pub level: Level,
}

impl Region {
    pub fn new(code: impl Into<String>, name: impl Into<String>, level: Level) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            level,
        }
    }
}

/// Parameters of a single option-list fetch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegionQuery {
    pub level: Level,
    /// Parent code; `None` only for [`Level::Province`].
    pub parent: Option<String>,
}

impl RegionQuery {
    /// Unfiltered province query.
    pub fn provinces() -> Self {
        Self {
            level: Level::Province,
            parent: None,
        }
    }

    /// Children of `parent` at `level`.
    pub fn children(level: Level, parent: impl Into<String>) -> Self {
        Self {
            level,
            parent: Some(parent.into()),
        }
    }

    /// Build a query, checking that a parent is present exactly when the
    /// level has one.
    pub fn for_level(level: Level, parent: Option<&str>) -> Result<Self, String> {
        match (level, parent) {
            (Level::Province, None) => Ok(Self::provinces()),
            (Level::Province, Some(_)) => Err("province queries take no parent code".to_string()),
            (_, Some(code)) if !code.is_empty() => Ok(Self::children(level, code)),
            (_, _) => Err(format!("{} queries require a parent code", level)),
        }
    }
}

/// Wire shape of the region endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct RegionPage {
    #[serde(default)]
    pub(crate) data: Vec<Region>,
}

impl RegionPage {
    /// Keep entries of the requested level, at most `page_size` of them.
    pub(crate) fn into_regions(self, level: Level, page_size: usize) -> Vec<Region> {
        let total = self.data.len();
        let regions: Vec<Region> = self
            .data
            .into_iter()
            .filter(|region| region.level == level)
            .take(page_size)
            .collect();
        if regions.len() < total {
            log::debug!(
                target: "wilayah::source",
                "Dropped {} of {} {} entries (wrong level or over page size)",
                total - regions.len(),
                total,
                level
            );
        }
        regions
    }
}

use crate::region::Level;
use std::fmt;

/// Owner callback for one level, called with `(code, name)`.
pub type LevelCallback = Box<dyn FnMut(&str, &str) + Send>;

/// One optional callback per level.
///
/// Callbacks fire only when the user selects a code that resolves against
/// the loaded option list. Refetches and descendant resets never call them.
#[derive(Default)]
pub struct Callbacks {
    handlers: [Option<LevelCallback>; 4],
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, level: Level, callback: impl FnMut(&str, &str) + Send + 'static) -> Self {
        self.handlers[level.index()] = Some(Box::new(callback));
        self
    }

    pub fn on_province(self, callback: impl FnMut(&str, &str) + Send + 'static) -> Self {
        self.on(Level::Province, callback)
    }

    pub fn on_district(self, callback: impl FnMut(&str, &str) + Send + 'static) -> Self {
        self.on(Level::District, callback)
    }

    pub fn on_city(self, callback: impl FnMut(&str, &str) + Send + 'static) -> Self {
        self.on(Level::City, callback)
    }

    pub fn on_village(self, callback: impl FnMut(&str, &str) + Send + 'static) -> Self {
        self.on(Level::Village, callback)
    }

    pub(crate) fn notify(&mut self, level: Level, code: &str, name: &str) {
        if let Some(callback) = self.handlers[level.index()].as_mut() {
            callback(code, name);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<Level> = Level::ALL
            .into_iter()
            .filter(|level| self.handlers[level.index()].is_some())
            .collect();
        f.debug_struct("Callbacks")
            .field("registered", &registered)
            .finish()
    }
}

//! Application state management

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::commands::Navigator;
use crate::config::Config;
use crate::marks::MarksRepository;
use crate::session::ReadingSession;
use crate::verses::{UnitId, VerseRepository};
use crate::error::Result;

/// A session over the service's own repositories
pub type Session = ReadingSession<MarksRepository, VerseRepository>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    marks: MarksRepository,
    verses: VerseRepository,
    navigator: Mutex<Navigator>,
}

impl AppState {
    pub fn new(config: Config, marks: MarksRepository, verses: VerseRepository) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                marks,
                verses,
                navigator: Mutex::new(Navigator::default()),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the marks repository
    pub fn marks(&self) -> &MarksRepository {
        &self.inner.marks
    }

    /// Get the verse repository
    pub fn verses(&self) -> &VerseRepository {
        &self.inner.verses
    }

    /// The reader's view state; one local reader per service
    pub fn navigator(&self) -> &Mutex<Navigator> {
        &self.inner.navigator
    }

    pub fn timeout(&self) -> Duration {
        self.inner.config.persistence.timeout()
    }

    /// Open a reading session on `unit`
    pub async fn session(&self, unit: UnitId) -> Result<Session> {
        ReadingSession::open(
            self.inner.marks.clone(),
            self.inner.verses.clone(),
            self.timeout(),
            unit,
        )
        .await
    }
}

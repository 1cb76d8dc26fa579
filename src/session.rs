//! In-memory page session: current image, latest results, history and phase.

use std::collections::HashMap;

use serde::Serialize;

use crate::encoder::{Image, ImageId};
use crate::language::Language;

pub const NO_DESCRIPTION: &str = "No description available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Analyzing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub url: String,
    pub name: Option<String>,
    pub mime_type: String,
}

impl From<&Image> for ImageView {
    fn from(image: &Image) -> Self {
        Self {
            url: image.url(),
            name: image.name().map(str::to_string),
            mime_type: image.mime_type().to_string(),
        }
    }
}

/// Everything the page needs to render itself.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub image: Option<ImageView>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub questions: Vec<String>,
    pub language: Language,
    pub languages: [Language; 6],
    pub history: Vec<HistoryEntry>,
    pub phase: Phase,
    pub notice: Option<String>,
    /// A debounced follow-up question is waiting to run.
    pub follow_up_pending: bool,
}

/// In-memory state of the single page session.
#[derive(Debug, Default)]
pub struct SessionState {
    current: Option<Image>,
    // Images referenced by history entries, kept so their urls stay valid.
    retained: HashMap<ImageId, Image>,
    description: Option<String>,
    keywords: Vec<String>,
    questions: Vec<String>,
    language: Language,
    history: Vec<HistoryEntry>,
    phase: Phase,
    notice: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current image. Results and history are left alone.
    pub fn set_image(&mut self, image: Image) {
        self.current = Some(image);
    }

    pub fn current_image(&self) -> Option<&Image> {
        self.current.as_ref()
    }

    pub fn image(&self, id: ImageId) -> Option<&Image> {
        self.current
            .as_ref()
            .filter(|image| image.id() == id)
            .or_else(|| self.retained.get(&id))
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Moves to `Analyzing`. Returns false when an analysis is already running.
    pub fn begin_analysis(&mut self) -> bool {
        if self.phase == Phase::Analyzing {
            return false;
        }
        self.phase = Phase::Analyzing;
        self.notice = None;
        true
    }

    /// Applies a successful description. The question list is cleared until
    /// [`SessionState::set_questions`] supplies the one derived from the same
    /// text.
    ///
    /// Returns the resolved description stored in the session and history.
    pub fn record_description(
        &mut self,
        image: &Image,
        description: &str,
        keywords: Vec<String>,
    ) -> String {
        let resolved = if description.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            description.to_string()
        };

        self.description = Some(resolved.clone());
        self.keywords = keywords;
        self.questions.clear();
        self.history.push(HistoryEntry {
            image_url: image.url(),
            description: resolved.clone(),
        });
        self.retained
            .entry(image.id())
            .or_insert_with(|| image.clone());
        resolved
    }

    pub fn set_questions(&mut self, questions: Vec<String>) {
        self.questions = questions;
    }

    pub fn finish_analysis(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Ends the analysis without touching any result field.
    pub fn fail_analysis(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
        self.phase = Phase::Idle;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            image: self.current.as_ref().map(ImageView::from),
            description: self.description.clone(),
            keywords: self.keywords.clone(),
            questions: self.questions.clone(),
            language: self.language,
            languages: Language::ALL,
            history: self.history.clone(),
            phase: self.phase,
            notice: self.notice.clone(),
            follow_up_pending: false,
        }
    }
}

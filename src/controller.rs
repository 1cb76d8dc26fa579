//! Turns page events into analysis calls and session updates.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::analysis::{AnalysisClient, AnalysisError};
use crate::debounce::Debouncer;
use crate::encoder::{Image, ImageId};
use crate::keywords::extract_default;
use crate::language::Language;
use crate::session::{SessionSnapshot, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// No image has been uploaded yet.
    Skipped,
    /// Another analysis is still running.
    Busy,
    Completed,
}

pub fn keyword_instruction(keyword: &str) -> String {
    format!("Focus more on aspects related to \"{keyword}\".")
}

pub fn question_instruction(question: &str, language: Language) -> String {
    format!("Answer the following question about the image in {language}: \"{question}\"")
}

pub struct InteractionController {
    client: AnalysisClient,
    state: Mutex<SessionState>,
    follow_up: Debouncer,
    idle: Notify,
}

impl InteractionController {
    pub fn new(client: AnalysisClient, follow_up_delay: Duration) -> Self {
        Self {
            client,
            state: Mutex::new(SessionState::new()),
            follow_up: Debouncer::new(follow_up_delay),
            idle: Notify::new(),
        }
    }

    // The lock is only ever held for synchronous bookkeeping.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = self.state().snapshot();
        snapshot.follow_up_pending = self.follow_up.is_pending();
        snapshot
    }

    pub fn upload(&self, image: Image) -> ImageId {
        let id = image.id();
        tracing::info!(image = %id, mime_type = image.mime_type(), bytes = image.bytes().len(), "image uploaded");
        self.state().set_image(image);
        id
    }

    pub fn image(&self, id: ImageId) -> Option<Image> {
        self.state().image(id).cloned()
    }

    pub fn set_language(&self, language: Language) {
        tracing::info!(%language, "language changed");
        self.state().set_language(language);
    }

    /// Claims the session for one analysis cycle. On `Ok` the phase is
    /// already `Analyzing`.
    fn begin(&self) -> Result<(Image, Language), AnalyzeOutcome> {
        let mut state = self.state();
        let Some(image) = state.current_image().cloned() else {
            tracing::debug!("analyze requested without an image");
            return Err(AnalyzeOutcome::Skipped);
        };
        if !state.begin_analysis() {
            tracing::debug!("analysis already in progress");
            return Err(AnalyzeOutcome::Busy);
        }
        Ok((image, state.language()))
    }

    /// Runs one analysis cycle on the current image.
    ///
    /// On failure the session keeps its previous results and records a
    /// notice; the error is returned for the caller to surface.
    pub async fn analyze(&self, extra_instruction: Option<String>) -> Result<AnalyzeOutcome, AnalysisError> {
        match self.begin() {
            Ok((image, language)) => self.run(image, language, extra_instruction).await,
            Err(outcome) => Ok(outcome),
        }
    }

    async fn run(
        &self,
        image: Image,
        language: Language,
        extra_instruction: Option<String>,
    ) -> Result<AnalyzeOutcome, AnalysisError> {
        tracing::info!(image = %image.id(), %language, "analysis started");

        let result = match self
            .client
            .describe_image(&image, language, extra_instruction.as_deref())
            .await
        {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(image = %image.id(), error = %err, "analysis failed");
                self.state().fail_analysis(err.notice());
                self.idle.notify_waiters();
                return Err(err);
            }
        };

        let keywords = extract_default(&result.description);
        self.state()
            .record_description(&image, &result.description, keywords);

        let questions = if result.description.is_empty() {
            Vec::new()
        } else {
            self.client
                .generate_related_questions(&result.description, language)
                .await
        };

        let history = {
            let mut state = self.state();
            state.set_questions(questions);
            state.finish_analysis();
            state.history().len()
        };
        self.idle.notify_waiters();
        tracing::info!(image = %image.id(), history, "analysis finished");

        Ok(AnalyzeOutcome::Completed)
    }

    /// Claims the session now and runs the cycle on its own task, so that
    /// dropping the caller never abandons a half-applied cycle.
    pub fn spawn_analyze(
        self: &Arc<Self>,
        extra_instruction: Option<String>,
    ) -> JoinHandle<Result<AnalyzeOutcome, AnalysisError>> {
        let claimed = self.begin();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            match claimed {
                Ok((image, language)) => this.run(image, language, extra_instruction).await,
                Err(outcome) => Ok(outcome),
            }
        })
    }

    pub fn spawn_keyword(
        self: &Arc<Self>,
        keyword: &str,
    ) -> JoinHandle<Result<AnalyzeOutcome, AnalysisError>> {
        tracing::info!(keyword, "keyword selected");
        self.spawn_analyze(Some(keyword_instruction(keyword)))
    }

    /// Schedules a follow-up answering `question`. A newer click within the
    /// debounce delay replaces this one.
    ///
    /// If another analysis is still running when the delay elapses, the
    /// follow-up stays pending until that one finishes and then runs.
    pub fn click_question(self: &Arc<Self>, question: String) {
        tracing::info!(question = %question, delay = ?self.follow_up.delay(), "follow-up scheduled");
        let this = Arc::clone(self);
        self.follow_up.schedule(async move {
            loop {
                let idle = this.idle.notified();
                tokio::pin!(idle);
                idle.as_mut().enable();

                match this.begin() {
                    Ok((image, language)) => {
                        let extra = Some(question_instruction(&question, language));
                        // Detached so a later click cannot abort a call already in flight.
                        let runner = Arc::clone(&this);
                        tokio::spawn(async move { runner.run(image, language, extra).await });
                        return;
                    }
                    Err(AnalyzeOutcome::Busy) => {
                        tracing::debug!(question = %question, "follow-up waiting for the running analysis");
                        idle.await;
                    }
                    Err(_) => {
                        tracing::warn!(question = %question, "follow-up dropped, no image to analyze");
                        return;
                    }
                }
            }
        });
    }

    pub fn follow_up_pending(&self) -> bool {
        self.follow_up.is_pending()
    }
}

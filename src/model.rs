//! The text-generation seam the analysis client talks to.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::encoder::EncodedImage;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request to the model service failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("model service rejected the API key ({0})")]
    Unauthorized(StatusCode),
    #[error("model service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed response from model service: {0}")]
    Malformed(String),
}

/// One entry of the ordered content list sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineData { mime_type: String, data: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text(text) => Some(text),
            ContentPart::InlineData { .. } => None,
        }
    }

    pub fn is_inline_data(&self) -> bool {
        matches!(self, ContentPart::InlineData { .. })
    }
}

impl From<EncodedImage> for ContentPart {
    fn from(image: EncodedImage) -> Self {
        ContentPart::InlineData {
            mime_type: image.mime_type,
            data: image.data,
        }
    }
}

/// A remote text generator: ordered content parts in, generated text out.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, parts: Vec<ContentPart>) -> Result<String, ServiceError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    type Responder = dyn Fn(&[ContentPart]) -> Result<String, ServiceError> + Send + Sync;

    /// In-process model that answers from a closure and records every call.
    pub struct ScriptedModel {
        respond: Box<Responder>,
        calls: Mutex<Vec<Vec<ContentPart>>>,
    }

    impl ScriptedModel {
        pub fn new<F>(respond: F) -> Self
        where
            F: Fn(&[ContentPart]) -> Result<String, ServiceError> + Send + Sync + 'static,
        {
            Self {
                respond: Box::new(respond),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Answers image requests with `description` and text-only requests
        /// with `questions`.
        pub fn answering(description: &str, questions: &str) -> Self {
            let description = description.to_string();
            let questions = questions.to_string();
            Self::new(move |parts| {
                if parts.iter().any(ContentPart::is_inline_data) {
                    Ok(description.clone())
                } else {
                    Ok(questions.clone())
                }
            })
        }

        /// Describes images but fails every follow-up question request.
        pub fn failing_questions(description: &str) -> Self {
            let description = description.to_string();
            Self::new(move |parts| {
                if parts.iter().any(ContentPart::is_inline_data) {
                    Ok(description.clone())
                } else {
                    Err(ServiceError::Malformed("no candidates".into()))
                }
            })
        }

        pub fn failing() -> Self {
            Self::new(|_| Err(ServiceError::Unauthorized(StatusCode::FORBIDDEN)))
        }

        pub fn calls(&self) -> Vec<Vec<ContentPart>> {
            self.calls.lock().unwrap().clone()
        }

        /// Prompt text of every request that carried an image.
        pub fn image_prompts(&self) -> Vec<String> {
            self.calls()
                .iter()
                .filter(|parts| parts.iter().any(ContentPart::is_inline_data))
                .map(|parts| {
                    parts
                        .iter()
                        .filter_map(ContentPart::as_text)
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .collect()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, parts: Vec<ContentPart>) -> Result<String, ServiceError> {
            let result = (self.respond)(&parts);
            self.calls.lock().unwrap().push(parts);
            result
        }
    }
}

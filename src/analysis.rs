use std::sync::Arc;

use crate::encoder::{self, EncodingError, Image, ImageId};
use crate::language::Language;
use crate::model::{ContentPart, GenerativeModel, ServiceError};
use crate::normalize::normalize;

pub const DESCRIBE_INSTRUCTION: &str = "Analyze the image and provide a detailed description.";

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl AnalysisError {
    /// Message shown to the user in place of the internal error.
    pub fn notice(&self) -> &'static str {
        match self {
            AnalysisError::Encoding(_) => "The image could not be read.",
            AnalysisError::Service(_) => "The analysis service is temporarily unavailable.",
        }
    }
}

/// One description request, built per call and never stored.
#[derive(Debug)]
pub struct AnalysisRequest<'a> {
    pub image: &'a Image,
    pub prompt: String,
    pub language: Language,
}

impl<'a> AnalysisRequest<'a> {
    pub fn new(image: &'a Image, language: Language, extra_instruction: Option<&str>) -> Self {
        let mut prompt = format!("{DESCRIBE_INSTRUCTION} Respond in {language}.");
        if let Some(extra) = extra_instruction.map(str::trim).filter(|s| !s.is_empty()) {
            prompt.push(' ');
            prompt.push_str(extra);
        }
        Self {
            image,
            prompt,
            language,
        }
    }

    pub fn image_id(&self) -> ImageId {
        self.image.id()
    }

    fn into_parts(self) -> Result<Vec<ContentPart>, EncodingError> {
        let encoded = encoder::encode(self.image)?;
        Ok(vec![ContentPart::Text(self.prompt), encoded.into()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub description: String,
    pub raw_text: String,
}

fn related_questions_prompt(description: &str, language: Language) -> String {
    format!(
        "Based on the following information about an image, generate exactly 5 related \
         questions that someone might ask to learn more about the subject of the image. \
         Write the questions in {language}.\n\n{description}\n\n\
         Format the output as a single list of questions, each on a new line."
    )
}

/// Description and follow-up question calls against one shared model.
#[derive(Clone)]
pub struct AnalysisClient {
    model: Arc<dyn GenerativeModel>,
}

impl AnalysisClient {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub async fn describe_image(
        &self,
        image: &Image,
        language: Language,
        extra_instruction: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let request = AnalysisRequest::new(image, language, extra_instruction);
        tracing::debug!(image = %request.image_id(), %language, prompt = %request.prompt, "describing image");

        let parts = request.into_parts()?;
        let raw_text = self.model.generate(parts).await?;

        Ok(AnalysisResult {
            description: normalize(&raw_text),
            raw_text,
        })
    }

    /// Never fails: a service error degrades to an empty list.
    pub async fn generate_related_questions(
        &self,
        description: &str,
        language: Language,
    ) -> Vec<String> {
        let prompt = related_questions_prompt(description, language);
        match self.model.generate(vec![ContentPart::Text(prompt)]).await {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "related questions unavailable");
                Vec::new()
            }
        }
    }
}

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use arcade_core::AiOpponent;
use arcade_types::AnswerSet;

/// `AiOpponent` backed by the Gemini generateContent API. Errors bubble up to
/// the round, which treats them as the AI forfeiting the round.
pub struct GeminiOpponent {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

impl GeminiOpponent {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.gemini_endpoint.clone(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        }
    }

    fn prompt(letter: char) -> String {
        format!(
            "You are playing the Persian category word game Esm Famil. \
             Give one Persian word starting with the letter '{letter}' for each \
             category. Respond with only a JSON object with the keys \
             \"name\", \"family\", \"city\", \"country\", \"animal\", \
             \"food\" and \"object\". Leave a key as an empty string if you \
             cannot think of a word for it."
        )
    }

    fn parse_answers(body: GenerateContentResponse) -> Result<AnswerSet> {
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| anyhow!("Empty model response"))?;

        // Missing keys deserialize to empty strings, so a sloppy model
        // response still yields a usable sheet.
        serde_json::from_str(text).context("Model response was not the requested JSON object")
    }
}

#[async_trait]
impl AiOpponent for GeminiOpponent {
    async fn category_answers(&self, letter: char) -> Result<AnswerSet> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("GEMINI_API_KEY not configured"))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, self.model, api_key
        );

        let request_body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": Self::prompt(letter) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json"
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .context("Gemini request failed")?
            .error_for_status()
            .context("Gemini returned an error status")?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to decode Gemini response")?;

        let answers = Self::parse_answers(body)?;
        debug!("AI answers for '{letter}': {answers:?}");
        Ok(answers)
    }
}

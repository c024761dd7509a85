//! Semantic checks by a vision-capable LLM
//!
//! Two questions are asked: which of several search candidates best shows
//! a word, and whether one given image shows it correctly. The model's
//! answer is JSON; anything that cannot be read as the expected record is
//! turned into a conservative reject so the caller falls through.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::openai_client::OpenAiClient;
use crate::types::{ImageCandidate, ImageValidation, WordRequest};

const SYSTEM_PROMPT: &str = "You review pictures for a vocabulary app used by children aged 4 to 8. \
A picture is correct only if a child would name the intended word when seeing it. \
Pictures must be child-friendly: no violence, no scary content, no text overlays. \
Answer with a single JSON object and nothing else.";

/// Result of ranking search candidates
#[derive(Debug, Clone, PartialEq)]
pub struct RankingVerdict {
    /// Index into the candidate list, `None` when nothing was picked
    pub best_index: Option<usize>,
    pub confidence: f32,
    pub reasoning: String,
    /// The picked image shows the word correctly (rule included)
    pub is_correct: bool,
    pub child_friendly: bool,
}

impl RankingVerdict {
    /// Conservative record used whenever the model gives no usable answer
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            best_index: None,
            confidence: 0.0,
            reasoning: reason.into(),
            is_correct: false,
            child_friendly: false,
        }
    }
}

#[async_trait]
pub trait SemanticEvaluator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Pick the best of `candidates` for the word
    async fn rank(
        &self,
        request: &WordRequest,
        rule: Option<&str>,
        candidates: &[ImageCandidate],
    ) -> RankingVerdict;

    /// Judge one image against the word
    async fn judge(&self, request: &WordRequest, rule: Option<&str>, image_url: &str)
        -> ImageValidation;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRanking {
    best_index: Option<i64>,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    is_correct: bool,
    #[serde(default)]
    child_friendly: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValidation {
    is_valid: bool,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    child_friendly: bool,
}

/// Cut the JSON object out of a model reply
///
/// Models sometimes wrap JSON in ``` fences or add a sentence around it.
fn json_object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Read a ranking reply; out-of-range indices are rejects
pub fn parse_ranking(text: &str, candidate_count: usize) -> RankingVerdict {
    let Some(slice) = json_object_slice(text) else {
        return RankingVerdict::rejected("Evaluator reply contained no JSON object");
    };

    let raw: RawRanking = match serde_json::from_str(slice) {
        Ok(raw) => raw,
        Err(e) => return RankingVerdict::rejected(format!("Unreadable evaluator reply: {}", e)),
    };

    let best_index = match raw.best_index {
        Some(i) if i >= 0 && (i as usize) < candidate_count => i as usize,
        Some(i) => {
            return RankingVerdict::rejected(format!(
                "Evaluator picked index {} outside {} candidates",
                i, candidate_count
            ))
        }
        None => return RankingVerdict::rejected(format!("Evaluator picked nothing: {}", raw.reasoning)),
    };

    RankingVerdict {
        best_index: Some(best_index),
        confidence: raw.confidence.clamp(0.0, 1.0),
        reasoning: raw.reasoning,
        is_correct: raw.is_correct,
        child_friendly: raw.child_friendly,
    }
}

/// Read a validation reply
pub fn parse_validation(text: &str) -> ImageValidation {
    let Some(slice) = json_object_slice(text) else {
        return ImageValidation::rejected("Evaluator reply contained no JSON object");
    };

    match serde_json::from_str::<RawValidation>(slice) {
        Ok(raw) => ImageValidation {
            is_valid: raw.is_valid,
            confidence: raw.confidence.clamp(0.0, 1.0),
            reasoning: raw.reasoning,
            child_friendly: raw.child_friendly,
            suggested_replacement: None,
        },
        Err(e) => ImageValidation::rejected(format!("Unreadable evaluator reply: {}", e)),
    }
}

fn word_line(request: &WordRequest, rule: Option<&str>) -> String {
    let mut line = format!(
        "Word: \"{}\" (German: \"{}\"), category: \"{}\".",
        request.word, request.translation, request.category
    );
    if let Some(rule) = rule {
        line.push_str(" Rule: ");
        line.push_str(rule);
    }
    line
}

/// Prompt text for ranking `count` candidates
pub fn ranking_prompt(request: &WordRequest, rule: Option<&str>, count: usize) -> String {
    format!(
        "{} The {} images below are numbered 0 to {} in order. \
Pick the one that best shows the word for a child. \
Reply as {{\"bestIndex\": number or null, \"confidence\": 0.0-1.0, \"reasoning\": string, \
\"isCorrect\": boolean, \"childFriendly\": boolean}}.",
        word_line(request, rule),
        count,
        count.saturating_sub(1)
    )
}

/// Prompt text for judging one image
pub fn validation_prompt(request: &WordRequest, rule: Option<&str>) -> String {
    format!(
        "{} Does the image below show this word correctly? \
Reply as {{\"isValid\": boolean, \"confidence\": 0.0-1.0, \"reasoning\": string, \
\"childFriendly\": boolean}}.",
        word_line(request, rule)
    )
}

/// Chat-completions evaluator with image inputs
pub struct OpenAiVisionEvaluator {
    client: OpenAiClient,
    model: String,
}

impl OpenAiVisionEvaluator {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn request_body(&self, prompt: String, image_urls: &[&str]) -> Value {
        let mut content = vec![json!({ "type": "text", "text": prompt })];
        content.extend(image_urls.iter().map(|url| {
            json!({ "type": "image_url", "image_url": { "url": url, "detail": "low" } })
        }));

        json!({
            "model": self.model,
            "temperature": 0,
            "max_tokens": 400,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": content },
            ],
        })
    }

    /// Send a request and return the assistant text, or a reason for failing
    async fn complete(&self, body: &Value) -> Result<String, String> {
        let response = self
            .client
            .post_json("chat/completions", body)
            .await
            .map_err(|e| format!("Evaluator call failed: {}", e))?;

        response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "Evaluator response had no message content".to_string())
    }
}

#[async_trait]
impl SemanticEvaluator for OpenAiVisionEvaluator {
    fn name(&self) -> &'static str {
        "openai-vision"
    }

    async fn rank(
        &self,
        request: &WordRequest,
        rule: Option<&str>,
        candidates: &[ImageCandidate],
    ) -> RankingVerdict {
        if candidates.is_empty() {
            return RankingVerdict::rejected("No candidates to rank");
        }

        let urls: Vec<&str> = candidates.iter().map(|c| c.thumbnail_url.as_str()).collect();
        let body = self.request_body(ranking_prompt(request, rule, candidates.len()), &urls);

        match self.complete(&body).await {
            Ok(text) => {
                let verdict = parse_ranking(&text, candidates.len());
                tracing::debug!(
                    word = %request.word,
                    best_index = ?verdict.best_index,
                    confidence = verdict.confidence,
                    "Ranking verdict"
                );
                verdict
            }
            Err(reason) => {
                tracing::warn!(word = %request.word, reason = %reason, "Ranking failed");
                RankingVerdict::rejected(reason)
            }
        }
    }

    async fn judge(
        &self,
        request: &WordRequest,
        rule: Option<&str>,
        image_url: &str,
    ) -> ImageValidation {
        let body = self.request_body(validation_prompt(request, rule), &[image_url]);

        match self.complete(&body).await {
            Ok(text) => parse_validation(&text),
            Err(reason) => {
                tracing::warn!(word = %request.word, reason = %reason, "Validation failed");
                ImageValidation::rejected(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_ranking_plain() {
        let verdict = parse_ranking(
            r#"{"bestIndex": 2, "confidence": 0.93, "reasoning": "clear cat", "isCorrect": true, "childFriendly": true}"#,
            3,
        );
        assert_eq!(verdict.best_index, Some(2));
        assert_eq!(verdict.confidence, 0.93);
        assert!(verdict.is_correct);
        assert!(verdict.child_friendly);
    }

    #[test]
    fn test_parse_ranking_fenced() {
        let text = "```json\n{\"bestIndex\": 0, \"confidence\": 1.4, \"reasoning\": \"ok\", \"isCorrect\": true, \"childFriendly\": true}\n```";
        let verdict = parse_ranking(text, 1);
        assert_eq!(verdict.best_index, Some(0));
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_parse_ranking_out_of_range_rejects() {
        let verdict = parse_ranking(r#"{"bestIndex": 5, "confidence": 0.99, "isCorrect": true}"#, 3);
        assert_eq!(verdict.best_index, None);
        assert_eq!(verdict.confidence, 0.0);
        assert!(!verdict.is_correct);

        let negative = parse_ranking(r#"{"bestIndex": -1, "confidence": 0.99}"#, 3);
        assert_eq!(negative.best_index, None);
    }

    #[test]
    fn test_parse_ranking_garbage_rejects() {
        assert_eq!(parse_ranking("I cannot help with that.", 3).best_index, None);
        assert_eq!(parse_ranking("{not json}", 3).confidence, 0.0);
        assert_eq!(parse_ranking(r#"{"bestIndex": null, "reasoning": "none fit"}"#, 3).best_index, None);
    }

    #[test]
    fn test_parse_validation() {
        let v = parse_validation(
            r#"Sure: {"isValid": false, "confidence": 0.8, "reasoning": "three adults", "childFriendly": true}"#,
        );
        assert!(!v.is_valid);
        assert_eq!(v.confidence, 0.8);
        assert_eq!(v.reasoning, "three adults");
        assert!(v.child_friendly);
    }

    #[test]
    fn test_parse_validation_missing_field_rejects() {
        let v = parse_validation(r#"{"confidence": 0.9}"#);
        assert!(!v.is_valid);
        assert_eq!(v.confidence, 0.0);
        assert!(!v.child_friendly);
    }

    #[test]
    fn test_prompts_include_rule() {
        let req = WordRequest::new("parents", "Eltern", "family");
        let prompt = ranking_prompt(&req, Some("exactly two adults"), 4);
        assert!(prompt.contains("Rule: exactly two adults"));
        assert!(prompt.contains("numbered 0 to 3"));
        assert!(!validation_prompt(&req, None).contains("Rule:"));
    }

    #[test]
    fn test_request_body_shape() {
        let client =
            OpenAiClient::new("k".to_string(), "https://api.openai.com/v1", Duration::from_secs(5))
                .unwrap();
        let evaluator = OpenAiVisionEvaluator::new(client, "gpt-4o");
        let body = evaluator.request_body("p".to_string(), &["https://a", "https://b"]);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["response_format"]["type"], "json_object");
        let content = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(content.len(), 3);
        assert_eq!(content[2]["image_url"]["url"], "https://b");
    }
}

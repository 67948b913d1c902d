//! Recipe generator: turns a lead into a structured article draft via an LLM.
//!
//! The prompt and response contract live here; everything else about the model
//! is a black box. A response that is not valid JSON, or lacks a title or body,
//! is a failure. Nothing is stored by this module.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::recipe::RecipeConfig;
use crate::lead::ContentRecipe;

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("recipe generation is disabled")]
    Disabled,
    #[error("http error: {0}")]
    Http(String),
    #[error("provider returned status {0}")]
    Status(u16),
    #[error("provider returned invalid json: {0}")]
    InvalidJson(String),
    #[error("recipe is missing {0}")]
    Incomplete(&'static str),
}

#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    async fn generate(&self, title: &str, excerpt: &str) -> Result<ContentRecipe, RecipeError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynRecipeGenerator = Arc<dyn RecipeGenerator>;

/// Factory: build a generator according to config and environment variables.
///
/// * If `RECIPE_TEST_MODE=mock`, returns the deterministic mock.
/// * Else if `config.enabled == false`, returns a disabled generator.
/// * Else builds the configured HTTP provider.
pub fn build_generator(config: &RecipeConfig) -> DynRecipeGenerator {
    if std::env::var("RECIPE_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockGenerator);
    }

    if !config.enabled {
        return Arc::new(DisabledGenerator);
    }

    let timeout = Duration::from_secs(config.timeout_secs);
    match config.provider.as_str() {
        "openai" => Arc::new(OpenAiGenerator::new(
            config.api_key.clone(),
            config.model.as_deref(),
            timeout,
        )),
        "gemini" => Arc::new(GeminiGenerator::new(
            config.api_key.clone(),
            config.model.as_deref(),
            timeout,
        )),
        "mock" => Arc::new(MockGenerator),
        other => {
            tracing::warn!(target: "recipe", provider = other, "unknown recipe provider; disabled");
            Arc::new(DisabledGenerator)
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a senior entertainment news editor. \
Write factual, non-defamatory copy. Hedge unconfirmed claims (\"reportedly\", \"according to\"). \
Reply with ONE JSON object and nothing else.";

/// Prompt template for a single lead.
pub fn build_prompt(title: &str, excerpt: &str) -> String {
    format!(
        "Draft an article for this story lead.\n\
         Lead headline: {title}\n\
         Context: {excerpt}\n\n\
         Return JSON with exactly these keys:\n\
         \"title\" (catchy headline, <= 90 chars),\n\
         \"excerpt\" (1-2 sentence teaser),\n\
         \"body\" (400-600 words, HTML paragraphs),\n\
         \"seoTitle\" (<= 60 chars),\n\
         \"seoDescription\" (<= 155 chars),\n\
         \"keywords\" (array of 3-6 strings)."
    )
}

/// Parse and validate a model reply. Tolerates a surrounding ```json fence.
pub fn parse_recipe(raw: &str) -> Result<ContentRecipe, RecipeError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    let recipe: ContentRecipe =
        serde_json::from_str(body).map_err(|e| RecipeError::InvalidJson(e.to_string()))?;
    if recipe.title.trim().is_empty() {
        return Err(RecipeError::Incomplete("title"));
    }
    if recipe.body.trim().is_empty() {
        return Err(RecipeError::Incomplete("body"));
    }
    Ok(recipe)
}

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("buzz-lead-desk/0.1 (recipe generator)")
        .connect_timeout(Duration::from_secs(4))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

// ------------------------------------------------------------
// OpenAI (Chat Completions, JSON mode)
// ------------------------------------------------------------

pub struct OpenAiGenerator {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    /// `model_override`: defaults to gpt-4o-mini.
    pub fn new(api_key: String, model_override: Option<&str>, timeout: Duration) -> Self {
        Self {
            http: http_client(timeout),
            api_key,
            model: model_override.unwrap_or("gpt-4o-mini").to_string(),
        }
    }
}

#[async_trait]
impl RecipeGenerator for OpenAiGenerator {
    async fn generate(&self, title: &str, excerpt: &str) -> Result<ContentRecipe, RecipeError> {
        if self.api_key.is_empty() {
            return Err(RecipeError::Disabled);
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct ResponseFormat {
            r#type: &'static str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            response_format: ResponseFormat,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let prompt = build_prompt(title, excerpt);
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.7,
            response_format: ResponseFormat {
                r#type: "json_object",
            },
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| RecipeError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(RecipeError::Status(resp.status().as_u16()));
        }
        let body: Resp = resp
            .json()
            .await
            .map_err(|e| RecipeError::InvalidJson(e.to_string()))?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");
        parse_recipe(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Gemini (generateContent, JSON mime type)
// ------------------------------------------------------------

pub struct GeminiGenerator {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    /// `model_override`: defaults to gemini-1.5-flash.
    pub fn new(api_key: String, model_override: Option<&str>, timeout: Duration) -> Self {
        Self {
            http: http_client(timeout),
            api_key,
            model: model_override.unwrap_or("gemini-1.5-flash").to_string(),
        }
    }
}

#[async_trait]
impl RecipeGenerator for GeminiGenerator {
    async fn generate(&self, title: &str, excerpt: &str) -> Result<ContentRecipe, RecipeError> {
        if self.api_key.is_empty() {
            return Err(RecipeError::Disabled);
        }

        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Content,
        }
        #[derive(Deserialize)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }
        #[derive(Deserialize)]
        struct Part {
            #[serde(default)]
            text: String,
        }

        let prompt = format!("{SYSTEM_PROMPT}\n\n{}", build_prompt(title, excerpt));
        let req = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let resp = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .map_err(|e| RecipeError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(RecipeError::Status(resp.status().as_u16()));
        }
        let body: Resp = resp
            .json()
            .await
            .map_err(|e| RecipeError::InvalidJson(e.to_string()))?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or("");
        parse_recipe(text)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Offline generators
// ------------------------------------------------------------

/// Always fails with [`RecipeError::Disabled`].
pub struct DisabledGenerator;

#[async_trait]
impl RecipeGenerator for DisabledGenerator {
    async fn generate(&self, _title: &str, _excerpt: &str) -> Result<ContentRecipe, RecipeError> {
        Err(RecipeError::Disabled)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic template output for local runs and tests.
pub struct MockGenerator;

#[async_trait]
impl RecipeGenerator for MockGenerator {
    async fn generate(&self, title: &str, excerpt: &str) -> Result<ContentRecipe, RecipeError> {
        Ok(ContentRecipe {
            title: format!("{title}: What We Know"),
            excerpt: excerpt.chars().take(160).collect(),
            body: format!("<p>{title}.</p><p>{excerpt}</p>"),
            seo_title: title.chars().take(60).collect(),
            seo_description: excerpt.chars().take(155).collect(),
            keywords: vec!["celebrity".to_string(), "entertainment".to_string()],
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_fenced_json() {
        let raw = "```json\n{\"title\":\"T\",\"excerpt\":\"E\",\"body\":\"B\",\"seoTitle\":\"S\",\"keywords\":[\"k\"]}\n```";
        let r = parse_recipe(raw).unwrap();
        assert_eq!(r.title, "T");
        assert_eq!(r.seo_title, "S");
        assert_eq!(r.seo_description, "");
        assert_eq!(r.keywords, vec!["k".to_string()]);
    }

    #[test]
    fn parse_rejects_prose_and_empty_body() {
        assert!(matches!(
            parse_recipe("Sure! Here is your article"),
            Err(RecipeError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_recipe(r#"{"title":"T","excerpt":"E","body":"  "}"#),
            Err(RecipeError::Incomplete("body"))
        ));
    }

    #[test]
    fn prompt_carries_title_and_excerpt() {
        let p = build_prompt("Zendaya at the Met", "Custom Versace gown");
        assert!(p.contains("Zendaya at the Met"));
        assert!(p.contains("Custom Versace gown"));
        assert!(p.contains("seoDescription"));
    }

    #[tokio::test]
    async fn disabled_config_builds_disabled_generator() {
        let g = build_generator(&RecipeConfig::default());
        assert_eq!(g.provider_name(), "disabled");
        assert!(matches!(g.generate("a", "b").await, Err(RecipeError::Disabled)));
    }
}

//! Direct REST client for the Gemini `generateContent` API.
//!
//! Each call is a single blocking round trip on a spawned worker thread; the
//! returned future is the receiving half of a oneshot, polled per frame by the
//! UI. No retries, no streaming.

use futures::{channel::oneshot, future, FutureExt};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::{
    GatewayError, GatewayResult, ModelGateway, ANALYZE_FALLBACK, ANALYZE_INSTRUCTION,
    SUGGEST_FALLBACK, SUGGEST_INSTRUCTION,
};
use crate::{config::Config, image_utils::PngImage};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(
        default,
        rename = "inlineData",
        skip_serializing_if = "Option::is_none"
    )]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Inline PNG payload. `PngImage` holds bare bytes, so the transmitted
    /// base64 never carries a data-URI prefix.
    fn image(image: &PngImage) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: "image/png".into(),
                data: image.to_base64(),
            }),
            ..Default::default()
        }
    }
}

pub struct GeminiGateway {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    text_model: String,
    image_model: String,
}

impl GeminiGateway {
    pub fn new(api_key: Option<String>, config: &Config) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        }
    }

    pub fn from_env(config: &Config) -> Self {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        Self::new(api_key, config)
    }

    fn dispatch(
        &self,
        model: &str,
        body: GenerateContentRequest,
    ) -> future::BoxFuture<'static, GatewayResult<GenerateContentResponse>> {
        let Some(api_key) = self.api_key.clone() else {
            return future::ready(Err(GatewayError::MissingCredential)).boxed();
        };
        let url = format!("{BASE_URL}/{model}:generateContent?key={api_key}");
        debug!("POST {}", url.replace(&api_key, "***"));

        let client = self.client.clone();
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let _ = tx.send(send_request(&client, &url, &body));
        });
        rx.map(|received| {
            received.unwrap_or_else(|_| {
                Err(GatewayError::Failure("Gateway worker vanished".into()))
            })
        })
        .boxed()
    }
}

fn send_request(
    client: &reqwest::blocking::Client,
    url: &str,
    body: &GenerateContentRequest,
) -> GatewayResult<GenerateContentResponse> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .map_err(|e| GatewayError::Failure(format!("Request failed: {e}")))?;

    let status = response.status();
    let text = response
        .text()
        .map_err(|e| GatewayError::Failure(format!("Failed to read response: {e}")))?;

    if !status.is_success() {
        error!("Gemini API error: {status} - {text}");
        return Err(GatewayError::Failure(format!("HTTP {status}: {text}")));
    }

    serde_json::from_str(&text)
        .map_err(|e| GatewayError::Failure(format!("Unexpected response: {e}")))
}

fn first_text(response: &GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .iter()
        .flat_map(|c| &c.content.parts)
        .filter_map(|p| p.text.as_deref())
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_owned)
}

fn first_inline_image(response: &GenerateContentResponse) -> Option<PngImage> {
    response
        .candidates
        .iter()
        .flat_map(|c| &c.content.parts)
        .filter_map(|p| p.inline_data.as_ref())
        .find_map(|data| PngImage::from_base64(&data.data).ok())
}

fn text_or(response: &GenerateContentResponse, fallback: &str) -> String {
    first_text(response).unwrap_or_else(|| fallback.to_owned())
}

impl ModelGateway for GeminiGateway {
    fn suggest_prompt(&self, image: PngImage) -> future::BoxFuture<'static, GatewayResult<String>> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::image(&image), Part::text(SUGGEST_INSTRUCTION)],
            }],
            generation_config: None,
        };
        self.dispatch(&self.text_model, body)
            .map(|r| r.map(|response| text_or(&response, SUGGEST_FALLBACK)))
            .boxed()
    }

    fn analyze_result(
        &self,
        original: PngImage,
        result: PngImage,
    ) -> future::BoxFuture<'static, GatewayResult<String>> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::image(&original),
                    Part::image(&result),
                    Part::text(ANALYZE_INSTRUCTION),
                ],
            }],
            generation_config: None,
        };
        self.dispatch(&self.text_model, body)
            .map(|r| r.map(|response| text_or(&response, ANALYZE_FALLBACK)))
            .boxed()
    }

    fn inpaint(
        &self,
        image: PngImage,
        prompt: String,
    ) -> future::BoxFuture<'static, GatewayResult<PngImage>> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::image(&image), Part::text(prompt)],
            }],
            // The image model only emits image parts when asked for both
            // modalities.
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT", "IMAGE"],
            }),
        };
        self.dispatch(&self.image_model, body)
            .map(|r| {
                r.and_then(|response| {
                    first_inline_image(&response).ok_or(GatewayError::NoImageReturned)
                })
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::async_task::AsyncTask;

    fn tiny_png() -> PngImage {
        PngImage::from_rgba(&RgbaImage::new(1, 1)).unwrap()
    }

    fn response_from(json: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn missing_credential_fails_before_any_network_io() {
        let gateway = GeminiGateway::new(None, &Config::default());
        let mut task = AsyncTask::new(gateway.suggest_prompt(tiny_png()));
        assert!(matches!(
            task.data(),
            Some(Err(GatewayError::MissingCredential))
        ));
    }

    #[test]
    fn request_serializes_camel_case_inline_data() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::image(&tiny_png()), Part::text("hello")],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT", "IMAGE"],
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        let image_part = &json["contents"][0]["parts"][0]["inlineData"];
        assert_eq!(image_part["mimeType"], "image/png");
        // Bare base64, never a data URI.
        let data = image_part["data"].as_str().unwrap();
        assert!(!data.starts_with("data:"));
        assert_eq!(data, tiny_png().to_base64());
        assert_eq!(json["generationConfig"]["responseModalities"][0], "TEXT");
    }

    #[test]
    fn first_text_skips_empty_parts() {
        let response = response_from(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"text": "  "},
                {"text": "TASK: add people"}
            ]}}]
        }));
        assert_eq!(first_text(&response).as_deref(), Some("TASK: add people"));
    }

    #[test]
    fn empty_response_falls_back_to_literal() {
        let response = response_from(serde_json::json!({ "candidates": [] }));
        assert_eq!(text_or(&response, SUGGEST_FALLBACK), SUGGEST_FALLBACK);
    }

    #[test]
    fn first_inline_image_wins_over_later_parts() {
        let first = tiny_png();
        let second = PngImage::from_rgba(&RgbaImage::new(2, 2)).unwrap();
        let response = response_from(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"text": "here is your edit"},
                {"inlineData": {"mimeType": "image/png", "data": first.to_base64()}},
                {"inlineData": {"mimeType": "image/png", "data": second.to_base64()}}
            ]}}]
        }));
        assert_eq!(first_inline_image(&response).unwrap(), first);
    }

    #[test]
    fn response_without_image_part_yields_none() {
        let response = response_from(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "no image, sorry"}]}}]
        }));
        assert!(first_inline_image(&response).is_none());
    }

    #[test]
    fn unknown_part_shapes_are_tolerated() {
        let response = response_from(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"functionCall": {"name": "noop"}},
                {"text": "still parsed"}
            ]}}]
        }));
        assert_eq!(first_text(&response).as_deref(), Some("still parsed"));
    }
}

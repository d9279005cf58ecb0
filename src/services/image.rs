//! Image relay — validate an image prompt and forward it upstream.

use serde::Deserialize;
use serde_json::Value;

use super::relay::RelayError;
use crate::llm::LlmChat;
use crate::llm::types::{GeneratedImage, ImageRequest};

pub const MAX_IMAGES: u8 = 5;
pub const DEFAULT_RESOLUTION: &str = "512x512";
pub const RESOLUTIONS: &[&str] = &["256x256", "512x512", "1024x1024"];
pub const LOG_TAG: &str = "[IMAGE_ERROR]";

/// Wire shape of `POST /api/image`. `amount` arrives as a form string in
/// practice, so both strings and numbers are accepted.
#[derive(Debug, Deserialize)]
struct ImageBody {
    prompt: Option<String>,
    amount: Option<Value>,
    resolution: Option<String>,
}

/// Parse and validate an image request body.
///
/// # Errors
///
/// Returns [`RelayError::InvalidPayload`] for a missing prompt, an amount
/// outside `1..=5`, or an unsupported resolution.
pub fn parse_image_request(body: &[u8]) -> Result<ImageRequest, RelayError> {
    let body: ImageBody =
        serde_json::from_slice(body).map_err(|e| RelayError::InvalidPayload(format!("body is not valid: {e}")))?;

    let prompt = body.prompt.unwrap_or_default();
    if prompt.trim().is_empty() {
        return Err(RelayError::InvalidPayload("prompt is required".into()));
    }

    let amount = match body.amount {
        None => 1,
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        Some(other) => return Err(RelayError::InvalidPayload(format!("amount has unsupported type: {other}"))),
    };
    let amount = u8::try_from(amount)
        .ok()
        .filter(|n| (1..=MAX_IMAGES).contains(n))
        .ok_or_else(|| RelayError::InvalidPayload(format!("amount must be between 1 and {MAX_IMAGES}")))?;

    let resolution = body.resolution.unwrap_or_else(|| DEFAULT_RESOLUTION.to_owned());
    if !RESOLUTIONS.contains(&resolution.as_str()) {
        return Err(RelayError::InvalidPayload(format!("unsupported resolution '{resolution}'")));
    }

    Ok(ImageRequest { prompt, amount, resolution })
}

/// Forward an image request to the provider.
///
/// # Errors
///
/// [`RelayError::Misconfigured`] without a provider, otherwise the classified
/// upstream failure.
pub async fn generate(llm: Option<&dyn LlmChat>, request: &ImageRequest) -> Result<Vec<GeneratedImage>, RelayError> {
    let Some(llm) = llm else {
        return Err(RelayError::Misconfigured);
    };
    let images = llm.generate_images(request).await?;
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_amount_and_resolution() {
        let req = parse_image_request(br#"{"prompt":"a horse in space"}"#).unwrap();
        assert_eq!(req.amount, 1);
        assert_eq!(req.resolution, DEFAULT_RESOLUTION);
    }

    #[test]
    fn parse_accepts_string_amount() {
        let req = parse_image_request(br#"{"prompt":"p","amount":"3","resolution":"1024x1024"}"#).unwrap();
        assert_eq!(req.amount, 3);
        assert_eq!(req.resolution, "1024x1024");
    }

    #[test]
    fn parse_accepts_numeric_amount() {
        let req = parse_image_request(br#"{"prompt":"p","amount":5}"#).unwrap();
        assert_eq!(req.amount, 5);
    }

    #[test]
    fn parse_rejects_out_of_range_amount() {
        for body in [
            br#"{"prompt":"p","amount":"0"}"#.as_slice(),
            br#"{"prompt":"p","amount":6}"#.as_slice(),
            br#"{"prompt":"p","amount":"lots"}"#.as_slice(),
            br#"{"prompt":"p","amount":300}"#.as_slice(),
        ] {
            assert!(matches!(parse_image_request(body), Err(RelayError::InvalidPayload(_))));
        }
    }

    #[test]
    fn parse_rejects_unknown_resolution() {
        let err = parse_image_request(br#"{"prompt":"p","resolution":"800x600"}"#).unwrap_err();
        assert!(matches!(err, RelayError::InvalidPayload(msg) if msg.contains("800x600")));
    }

    #[test]
    fn parse_rejects_blank_prompt() {
        assert!(parse_image_request(br#"{"prompt":"   "}"#).is_err());
        assert!(parse_image_request(br"{}").is_err());
    }

    #[tokio::test]
    async fn generate_without_provider_is_misconfigured() {
        let req = ImageRequest { prompt: "p".into(), amount: 1, resolution: DEFAULT_RESOLUTION.into() };
        assert!(matches!(generate(None, &req).await, Err(RelayError::Misconfigured)));
    }
}

//! Model-backed field extraction from statement text

use anyhow::{bail, Context, Result};
use cardmail_core::{normalize_amount, StatementRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Statement text beyond this many characters is cut before prompting.
pub const MAX_PROMPT_TEXT_CHARS: usize = 15_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns statement text into extracted fields. Total by contract:
/// whatever goes wrong, the caller gets a record back, empty at worst.
pub trait StatementExtractor {
    fn extract(&self, text: &str) -> StatementRecord;
}

/// Extractor backed by the Gemini `generateContent` endpoint.
pub struct GeminiExtractor {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiExtractor {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(GeminiExtractor {
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    // The pipeline is synchronous and the CLI uses #[tokio::main], so
    // we're often already inside a runtime. Creating a nested runtime
    // and calling block_on would panic.
    //
    // - If a runtime is already running: block_in_place + Handle::block_on
    // - Otherwise: create a runtime and block_on
    fn request_blocking(&self, prompt: &str) -> Result<String> {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.request(prompt)))
        } else {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(self.request(prompt))
        }
    }

    async fn request(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Part {
            text: String,
        }

        #[derive(Serialize)]
        struct TurnContent {
            role: String,
            parts: Vec<Part>,
        }

        #[derive(Serialize)]
        struct Req {
            contents: Vec<TurnContent>,
        }

        #[derive(Deserialize)]
        struct Resp {
            candidates: Option<Vec<Candidate>>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Option<CandidateContent>,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            parts: Option<Vec<RespPart>>,
        }

        #[derive(Deserialize)]
        struct RespPart {
            text: Option<String>,
        }

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = Req {
            contents: vec![TurnContent {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("gemini request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("gemini error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse gemini response")?;
        let mut s = String::new();
        for candidate in out.candidates.unwrap_or_default() {
            let parts = candidate.content.and_then(|c| c.parts).unwrap_or_default();
            for part in parts {
                if let Some(text) = part.text {
                    s.push_str(&text);
                }
            }
        }
        Ok(s)
    }
}

impl StatementExtractor for GeminiExtractor {
    fn extract(&self, text: &str) -> StatementRecord {
        if text.trim().is_empty() {
            log::info!("statement text is empty; skipping model extraction");
            return StatementRecord::default();
        }
        if self.api_key.is_empty() {
            log::error!("model API key not configured; skipping extraction");
            return StatementRecord::default();
        }

        let prompt = build_prompt(text);
        match self.request_blocking(&prompt) {
            Ok(raw) => match parse_model_response(&raw) {
                Ok(record) => record,
                Err(err) => {
                    log::error!("model response unusable: {err:#}");
                    StatementRecord::default()
                }
            },
            Err(err) => {
                log::error!("model call failed: {err:#}");
                StatementRecord::default()
            }
        }
    }
}

fn build_prompt(text: &str) -> String {
    let total_chars = text.chars().count();
    let truncated: String = text.chars().take(MAX_PROMPT_TEXT_CHARS).collect();
    if total_chars > MAX_PROMPT_TEXT_CHARS {
        log::info!(
            "statement text truncated to {MAX_PROMPT_TEXT_CHARS} of {total_chars} characters for the prompt"
        );
    }

    format!(
        r#"You are an expert financial data extractor. Analyze the provided credit card statement text and extract specific financial details.
Return these details ONLY in a valid JSON object format. Do not include any explanatory text before or after the JSON object.

The fields to extract are:
- "total_amount_due": The total outstanding amount that needs to be paid. Numeric value.
- "minimum_amount_due": The minimum payment required. Numeric value.
- "due_date": The payment deadline. Format as "DD-MM-YYYY" if possible; otherwise provide it as seen.
- "statement_date": The date the statement was generated. Format as "DD-MM-YYYY" if possible; otherwise provide it as seen.
- "card_last_4_digits": The last four digits of the credit card number, if visible. String.
- "bank_name": The name of the issuing bank (e.g. "HDFC Bank", "ICICI Bank", "SBI Card"). Infer from the text if possible.

Guidelines:
1. Accuracy is paramount. If a field is not present or cannot be confidently determined, set it to null or omit the key.
2. Amounts must be clean numeric values (e.g. 6225.00, not "Rs. 6,225.00").
3. Dates: prioritize "DD-MM-YYYY"; if the year of a due date is missing, infer it from the statement date when straightforward.
4. The entire output must be a single, valid JSON object.

Statement Text:
---
{truncated}
---
Valid JSON Output ONLY:"#
    )
}

/// Parse the model's reply into a record: strip markdown fences, parse
/// as JSON, and coerce each field. Amounts may arrive as JSON numbers
/// or formatted strings.
pub fn parse_model_response(raw: &str) -> Result<StatementRecord> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        bail!("model response was empty after cleanup");
    }
    let value: Value =
        serde_json::from_str(cleaned).context("model response is not valid JSON")?;

    Ok(StatementRecord {
        total_amount_due: amount_field(&value, "total_amount_due"),
        minimum_amount_due: amount_field(&value, "minimum_amount_due"),
        due_date: string_field(&value, "due_date"),
        statement_date: string_field(&value, "statement_date"),
        card_last_4_digits: string_field(&value, "card_last_4_digits"),
        bank_name: string_field(&value, "bank_name"),
    })
}

fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

fn amount_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let parsed = normalize_amount(s);
            if parsed.is_none() {
                log::warn!("could not read a number out of {key} value '{s}'");
            }
            parsed
        }
        _ => None,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        // models sometimes return card digits as a bare number
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_response() {
        let record = parse_model_response(
            "```json\n{\"total_amount_due\": 6225.0, \"minimum_amount_due\": 320.0}\n```",
        )
        .unwrap();
        assert_eq!(record.total_amount_due, Some(6225.0));
        assert_eq!(record.minimum_amount_due, Some(320.0));
    }

    #[test]
    fn test_bare_fence_without_language_tag() {
        let record = parse_model_response("```\n{\"bank_name\": \"HDFC Bank\"}\n```").unwrap();
        assert_eq!(record.bank_name.as_deref(), Some("HDFC Bank"));
    }

    #[test]
    fn test_amounts_as_formatted_strings() {
        let record = parse_model_response(
            "{\"total_amount_due\": \"Rs. 6,225.00\", \"minimum_amount_due\": \"₹320\"}",
        )
        .unwrap();
        assert_eq!(record.total_amount_due, Some(6225.0));
        assert_eq!(record.minimum_amount_due, Some(320.0));
    }

    #[test]
    fn test_unparseable_amount_becomes_none() {
        let record =
            parse_model_response("{\"total_amount_due\": \"not stated\"}").unwrap();
        assert_eq!(record.total_amount_due, None);
    }

    #[test]
    fn test_nulls_and_missing_keys() {
        let record = parse_model_response("{\"due_date\": null}").unwrap();
        assert_eq!(record.due_date, None);
        assert_eq!(record.statement_date, None);
        assert!(!record.has_any());
    }

    #[test]
    fn test_card_digits_as_number() {
        let record = parse_model_response("{\"card_last_4_digits\": 1234}").unwrap();
        assert_eq!(record.card_last_4_digits.as_deref(), Some("1234"));
    }

    #[test]
    fn test_empty_and_garbage_responses_fail() {
        assert!(parse_model_response("").is_err());
        assert!(parse_model_response("``````").is_err());
        assert!(parse_model_response("sorry, I cannot do that").is_err());
    }

    #[test]
    fn test_prompt_truncation_cuts_the_tail() {
        let text = format!("HEAD {} TAILMARKER", "b".repeat(MAX_PROMPT_TEXT_CHARS));
        let prompt = build_prompt(&text);
        assert!(prompt.contains("HEAD"));
        assert!(!prompt.contains("TAILMARKER"));
    }

    #[test]
    fn test_short_text_not_truncated() {
        let prompt = build_prompt("Total Amount Due: Rs. 6,225.00");
        assert!(prompt.contains("Total Amount Due: Rs. 6,225.00"));
        assert!(prompt.contains("Valid JSON Output ONLY:"));
    }
}

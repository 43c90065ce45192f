//! AI assist pass-throughs
//!
//! Each assist renders a fixed prompt template, forwards it to the completion
//! provider and tries to read the answer as JSON. A missing provider, a
//! provider error or an unparsable answer all degrade to the payload's
//! `unavailable()` value; callers never see an error from here.

use std::fmt::Write as _;
use std::future::Future;

use rust_decimal::prelude::ToPrimitive;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::entity::{strategies, trades};
use tracing::warn;

use super::gemini::GeminiService;

pub trait CompletionProvider {
    fn complete(&self, prompt: &str) -> impl Future<Output = anyhow::Result<String>> + Send;
}

impl CompletionProvider for GeminiService {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.generate(prompt).await
    }
}

/// Response shapes returned by the assist endpoints.
pub trait AssistPayload: DeserializeOwned + Serialize {
    fn unavailable() -> Self;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInsights {
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    pub summary: String,
}

impl AssistPayload for TradeInsights {
    fn unavailable() -> Self {
        Self {
            insights: Vec::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            summary: "AI analysis unavailable".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReview {
    #[serde(default)]
    pub score: Option<u8>,
    pub feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl AssistPayload for StrategyReview {
    fn unavailable() -> Self {
        Self {
            score: None,
            feedback: "AI review unavailable".to_string(),
            suggestions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCheck {
    pub assessment: String,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub suggested_position_size: Option<f64>,
}

impl AssistPayload for RiskCheck {
    fn unavailable() -> Self {
        Self {
            assessment: "AI risk check unavailable".to_string(),
            warnings: Vec::new(),
            suggested_position_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalPrompts {
    pub prompts: Vec<String>,
}

impl AssistPayload for JournalPrompts {
    fn unavailable() -> Self {
        Self { prompts: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachReply {
    pub reply: String,
}

impl AssistPayload for CoachReply {
    fn unavailable() -> Self {
        Self {
            reply: "AI assistant unavailable".to_string(),
        }
    }
}

// ---- prompt inputs ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDigest {
    pub symbol: String,
    pub direction: String,
    pub status: String,
    pub pnl: f64,
    pub r_multiple: Option<f64>,
    pub setup: Option<String>,
    pub tags: Vec<String>,
    pub entry_date: String,
}

impl From<&trades::Model> for TradeDigest {
    fn from(t: &trades::Model) -> Self {
        TradeDigest {
            symbol: t.symbol.clone(),
            direction: t.direction.clone(),
            status: t.status.clone(),
            pnl: t.pnl.to_f64().unwrap_or(0.0),
            r_multiple: t.r_multiple.and_then(|r| r.to_f64()),
            setup: t.setup.clone(),
            tags: t.tags.0.clone(),
            entry_date: t.entry_date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyReviewInput {
    pub name: String,
    pub market_bias: Option<String>,
    pub setup_rules: Option<String>,
    pub entry_rules: Option<String>,
    pub exit_rules: Option<String>,
    pub risk_rules: Option<String>,
    pub timeframe: Option<String>,
}

impl From<strategies::Model> for StrategyReviewInput {
    fn from(s: strategies::Model) -> Self {
        StrategyReviewInput {
            name: s.name,
            market_bias: s.market_bias,
            setup_rules: s.setup_rules,
            entry_rules: s.entry_rules,
            exit_rules: s.exit_rules,
            risk_rules: s.risk_rules,
            timeframe: s.timeframe,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskCheckInput {
    pub symbol: String,
    pub direction: String,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: Option<f64>,
    pub account_balance: f64,
    pub risk_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalPromptsInput {
    pub mood: Option<String>,
    pub focus: Option<String>,
    pub recent_summary: Option<String>,
}

const JSON_ONLY: &str =
    "Respond with a single JSON object only, no prose and no markdown outside the JSON.";

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or("N/A")
}

pub fn trade_insights_prompt(trades: &[TradeDigest]) -> String {
    let mut prompt = String::from(
        "You are a trading performance coach. Review the trader's recent journal entries below \
         and find behavioural and statistical patterns.\n\n**Trades (newest first):**\n",
    );
    if trades.is_empty() {
        prompt.push_str("- no trades logged yet\n");
    }
    for t in trades {
        let _ = writeln!(
            prompt,
            "- {} {} {} | status: {} | P&L: {:.2} | R: {} | setup: {} | tags: {}",
            t.entry_date,
            t.direction,
            t.symbol,
            t.status,
            t.pnl,
            t.r_multiple.map(|r| format!("{:.2}", r)).unwrap_or_else(|| "N/A".to_string()),
            t.setup.as_deref().unwrap_or("N/A"),
            if t.tags.is_empty() { "none".to_string() } else { t.tags.join(", ") },
        );
    }
    let _ = write!(
        prompt,
        "\n{}\nShape: {{\"insights\": [string], \"strengths\": [string], \"weaknesses\": [string], \"summary\": string}}",
        JSON_ONLY
    );
    prompt
}

pub fn strategy_review_prompt(input: &StrategyReviewInput) -> String {
    format!(
        r#"You are an experienced discretionary trader reviewing a written trading plan.

**Strategy:** {}
- Timeframe: {}
- Market bias: {}
- Setup rules: {}
- Entry rules: {}
- Exit rules: {}
- Risk rules: {}

Score the plan from 1 to 10 for clarity and risk discipline, explain the score and list concrete improvements.
{}
Shape: {{"score": number, "feedback": string, "suggestions": [string]}}"#,
        input.name,
        or_na(&input.timeframe),
        or_na(&input.market_bias),
        or_na(&input.setup_rules),
        or_na(&input.entry_rules),
        or_na(&input.exit_rules),
        or_na(&input.risk_rules),
        JSON_ONLY
    )
}

pub fn risk_check_prompt(input: &RiskCheckInput) -> String {
    format!(
        r#"You are a risk manager. Evaluate this planned trade before it is placed.

- Symbol: {}
- Direction: {}
- Entry: {}
- Stop loss: {}
- Take profit: {}
- Account balance: {}
- Intended risk per trade: {}

Comment on stop placement, reward-to-risk and sizing. Suggest a position size in units.
{}
Shape: {{"assessment": string, "warnings": [string], "suggested_position_size": number}}"#,
        input.symbol,
        input.direction,
        input.entry_price,
        input.stop_loss,
        input.take_profit.map(|tp| tp.to_string()).unwrap_or_else(|| "N/A".to_string()),
        input.account_balance,
        input.risk_percent.map(|r| format!("{}%", r)).unwrap_or_else(|| "N/A".to_string()),
        JSON_ONLY
    )
}

pub fn journal_prompts_prompt(input: &JournalPromptsInput) -> String {
    format!(
        r#"You help traders keep a reflective journal. Write five short, specific journaling questions.

- Current mood: {}
- Focus area: {}
- Recent context: {}

{}
Shape: {{"prompts": [string]}}"#,
        or_na(&input.mood),
        or_na(&input.focus),
        or_na(&input.recent_summary),
        JSON_ONLY
    )
}

pub fn coach_chat_prompt(message: &str) -> String {
    format!(
        r#"You are a supportive trading coach inside a trading journal app. Answer the trader's question concisely.
Do not give personalised financial advice or price predictions.

Question: {}

{}
Shape: {{"reply": string}}"#,
        message.trim(),
        JSON_ONLY
    )
}

/// Strips a surrounding markdown code fence (with or without a language tag).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag line, e.g. ```json
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(strip_code_fences(text)).ok()
}

pub struct AiAssistant<P = GeminiService> {
    provider: Option<P>,
}

impl<P: CompletionProvider> AiAssistant<P> {
    pub fn new(provider: Option<P>) -> Self {
        Self { provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn ask<T: AssistPayload>(&self, prompt: &str) -> T {
        let Some(provider) = &self.provider else {
            return T::unavailable();
        };

        match provider.complete(prompt).await {
            Ok(text) => parse_json_reply(&text).unwrap_or_else(|| {
                warn!("AI reply was not valid JSON, using fallback payload");
                T::unavailable()
            }),
            Err(e) => {
                warn!("AI provider call failed: {}", e);
                T::unavailable()
            }
        }
    }

    pub async fn trade_insights(&self, trades: &[TradeDigest]) -> TradeInsights {
        self.ask(&trade_insights_prompt(trades)).await
    }

    pub async fn strategy_review(&self, input: &StrategyReviewInput) -> StrategyReview {
        self.ask(&strategy_review_prompt(input)).await
    }

    pub async fn risk_check(&self, input: &RiskCheckInput) -> RiskCheck {
        self.ask(&risk_check_prompt(input)).await
    }

    pub async fn journal_prompts(&self, input: &JournalPromptsInput) -> JournalPrompts {
        self.ask(&journal_prompts_prompt(input)).await
    }

    pub async fn coach(&self, message: &str) -> CoachReply {
        self.ask(&coach_chat_prompt(message)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_with_language_tag() {
        let text = "```json\n{\"prompts\": [\"a\"]}\n```";
        assert_eq!(strip_code_fences(text), "{\"prompts\": [\"a\"]}");
    }

    #[test]
    fn strips_bare_fences_and_whitespace() {
        assert_eq!(strip_code_fences("  ```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fences("{\"reply\":\"hi\"}"), "{\"reply\":\"hi\"}");
    }

    #[test]
    fn parse_reply_rejects_prose() {
        let parsed: Option<CoachReply> = parse_json_reply("Sure! Here is my answer.");
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_reply_fills_optional_lists() {
        let parsed: TradeInsights = parse_json_reply("```json\n{\"summary\": \"ok\"}\n```").unwrap();
        assert_eq!(parsed.summary, "ok");
        assert!(parsed.insights.is_empty());
    }

    #[test]
    fn prompts_carry_the_payload() {
        let prompt = strategy_review_prompt(&StrategyReviewInput {
            name: "London breakout".to_string(),
            risk_rules: Some("1% per trade".to_string()),
            ..Default::default()
        });
        assert!(prompt.contains("London breakout"));
        assert!(prompt.contains("1% per trade"));
        assert!(prompt.contains("Market bias: N/A"));

        let prompt = trade_insights_prompt(&[]);
        assert!(prompt.contains("no trades logged yet"));
    }
}

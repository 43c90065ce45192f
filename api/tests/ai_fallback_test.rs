//! Integration tests for AI assist fallbacks

use api::services::ai_assist::{
    AiAssistant, CompletionProvider, JournalPromptsInput, RiskCheckInput, StrategyReviewInput,
};
use serde_json::json;

struct Prose;

impl CompletionProvider for Prose {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok("Great question! Here are a few thoughts on your trading.".to_string())
    }
}

struct Failing;

impl CompletionProvider for Failing {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("upstream returned 503")
    }
}

struct Fenced;

impl CompletionProvider for Fenced {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok("```json\n{\"reply\": \"Cut losers early.\"}\n```".to_string())
    }
}

fn risk_input() -> RiskCheckInput {
    RiskCheckInput {
        symbol: "ES".to_string(),
        direction: "long".to_string(),
        entry_price: 5000.0,
        stop_loss: 4990.0,
        take_profit: Some(5030.0),
        account_balance: 25_000.0,
        risk_percent: Some(1.0),
    }
}

async fn assert_defaults<P: CompletionProvider>(ai: AiAssistant<P>) {
    let insights = serde_json::to_value(ai.trade_insights(&[]).await).unwrap();
    assert_eq!(
        insights,
        json!({ "insights": [], "strengths": [], "weaknesses": [], "summary": "AI analysis unavailable" })
    );

    let review = serde_json::to_value(ai.strategy_review(&StrategyReviewInput::default()).await).unwrap();
    assert_eq!(
        review,
        json!({ "score": null, "feedback": "AI review unavailable", "suggestions": [] })
    );

    let risk = serde_json::to_value(ai.risk_check(&risk_input()).await).unwrap();
    assert_eq!(
        risk,
        json!({ "assessment": "AI risk check unavailable", "warnings": [], "suggested_position_size": null })
    );

    let prompts = serde_json::to_value(ai.journal_prompts(&JournalPromptsInput::default()).await).unwrap();
    assert_eq!(prompts, json!({ "prompts": [] }));

    let reply = serde_json::to_value(ai.coach("How do I size positions?").await).unwrap();
    assert_eq!(reply, json!({ "reply": "AI assistant unavailable" }));
}

#[tokio::test]
async fn test_unconfigured_provider_returns_defaults() {
    let ai = AiAssistant::<Prose>::new(None);
    assert!(!ai.is_configured());
    assert_defaults(ai).await;
}

#[tokio::test]
async fn test_prose_reply_returns_defaults() {
    assert_defaults(AiAssistant::new(Some(Prose))).await;
}

#[tokio::test]
async fn test_provider_error_returns_defaults() {
    assert_defaults(AiAssistant::new(Some(Failing))).await;
}

#[tokio::test]
async fn test_fenced_json_reply_is_parsed() {
    let ai = AiAssistant::new(Some(Fenced));
    let reply = ai.coach("Any tips?").await;
    assert_eq!(reply.reply, "Cut losers early.");
}

//! Topic in, grounded news summary out.
//!
//! `NewsPipeline::fetch_news` never fails: every error is folded into a `NewsResult` whose
//! summary explains what went wrong and whose source list is empty. Callers that need to
//! branch on the failure use `fetch_outcome` instead.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::llm::{GroundingChunk, LlmProvider, LlmRequest};
use crate::timeout::with_timeout;

/// Message handed to the timeout guard; also recognized when it comes back as error text.
pub const TIMEOUT_MARKER: &str = "API_TIMEOUT";

pub const UNAVAILABLE_SUMMARY: &str = "目前無法獲取新聞，請稍後再試。";

pub const TIMEOUT_SUMMARY: &str = "⚠️ 運算時間較長 (Processing Delay)\n\n新聞搜尋與整理需要較多時間（約 20-40 秒），請再試一次，或檢查網路連線。";

pub const RATE_LIMITED_SUMMARY: &str = "⚠️ 達到使用上限 (Rate Limit Exceeded)\n\n您測試的頻率較高，已達到 API 的短時間限制。請休息 1-2 分鐘後再試。\n(Quota exhausted, please wait a moment)";

pub const INVALID_KEY_SUMMARY: &str = "⚠️ API Key 無效 (Invalid API Key)\n\n請檢查您的 API Key 是否正確設定。";

pub const CONNECTION_FAILED_SUMMARY: &str = "系統連線錯誤，無法擷取新聞。\n\nSystem Error: Connection Failed.";

pub const SYSTEM_INSTRUCTION: &str = "You are a professional Taiwanese news editor. You provide concise, objective summaries of current events in Traditional Chinese (zh-TW). You prioritize Taiwanese news sources and local context.";

/// A citation attached by the search service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// Summary plus citations; the only shape callers receive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsResult {
    pub summary: String,
    pub sources: Vec<Source>,
}

impl NewsResult {
    fn failed(kind: FailureKind) -> Self {
        Self {
            summary: kind.message().to_string(),
            sources: Vec::new(),
        }
    }
}

/// Why a search produced no news
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    RateLimited,
    InvalidCredential,
    Unknown,
}

impl FailureKind {
    /// Fixed bilingual text shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            FailureKind::Timeout => TIMEOUT_SUMMARY,
            FailureKind::RateLimited => RATE_LIMITED_SUMMARY,
            FailureKind::InvalidCredential => INVALID_KEY_SUMMARY,
            FailureKind::Unknown => CONNECTION_FAILED_SUMMARY,
        }
    }

    /// Classify an upstream error by its text.
    ///
    /// The service client exposes no structured error codes, so this looks for `429` and
    /// `API key` in the message. A change in upstream wording silently lands in `Unknown`.
    pub fn from_error_message(message: &str) -> Self {
        if message == TIMEOUT_MARKER {
            FailureKind::Timeout
        } else if message.contains("429") {
            FailureKind::RateLimited
        } else if message.contains("API key") {
            FailureKind::InvalidCredential
        } else {
            FailureKind::Unknown
        }
    }
}

/// Result of one pipeline run before it is collapsed for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsOutcome {
    Success(NewsResult),
    Failure(FailureKind),
}

impl NewsOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, NewsOutcome::Failure(_))
    }

    pub fn into_result(self) -> NewsResult {
        match self {
            NewsOutcome::Success(result) => result,
            NewsOutcome::Failure(kind) => NewsResult::failed(kind),
        }
    }
}

pub struct NewsPipeline {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl NewsPipeline {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Search news for `topic`. Never fails; see the module docs.
    pub async fn fetch_news(&self, topic: &str) -> NewsResult {
        self.fetch_outcome(topic).await.into_result()
    }

    /// Search news for `topic`, keeping the failure kind visible.
    pub async fn fetch_outcome(&self, topic: &str) -> NewsOutcome {
        let today = format_zh_tw_date(Local::now().date_naive());
        let request = LlmRequest {
            prompt: build_prompt(topic, &today),
            system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
            web_search: true,
        };

        info!(topic = %topic, timeout_secs = self.timeout.as_secs(), "searching news");

        let response = match with_timeout(self.provider.generate(request), self.timeout, TIMEOUT_MARKER).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let raw = format!("{:#}", e);
                let kind = FailureKind::from_error_message(&raw);
                error!(topic = %topic, kind = ?kind, error = %raw, "news search failed");
                return NewsOutcome::Failure(kind);
            }
            Err(elapsed) => {
                error!(topic = %topic, deadline = ?elapsed.deadline, "news search timed out");
                return NewsOutcome::Failure(FailureKind::Timeout);
            }
        };

        let summary = match response.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                warn!(topic = %topic, model = %response.model, "service returned no text");
                UNAVAILABLE_SUMMARY.to_string()
            }
        };
        let sources = collect_sources(&response.grounding_chunks);

        info!(
            topic = %topic,
            model = %response.model,
            sources = sources.len(),
            chunks = response.grounding_chunks.len(),
            "news search complete"
        );

        NewsOutcome::Success(NewsResult { summary, sources })
    }
}

/// Keep web chunks that carry both a title and a URI, dropping repeated URIs.
/// The first occurrence of a URI wins and input order is preserved.
pub fn collect_sources(chunks: &[GroundingChunk]) -> Vec<Source> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| match (web.title.as_deref(), web.uri.as_deref()) {
            (Some(title), Some(uri)) if !title.is_empty() && !uri.is_empty() => Some(Source {
                title: title.to_string(),
                uri: uri.to_string(),
            }),
            _ => None,
        })
        .filter(|source| seen.insert(source.uri.clone()))
        .collect()
}

/// Long-form Taiwanese date, e.g. `2026年10月19日 星期一`.
pub fn format_zh_tw_date(date: NaiveDate) -> String {
    // chrono's zh_TW locale spells weekdays 週一..週日, so the long form is mapped here
    let weekday = match date.weekday() {
        Weekday::Mon => "星期一",
        Weekday::Tue => "星期二",
        Weekday::Wed => "星期三",
        Weekday::Thu => "星期四",
        Weekday::Fri => "星期五",
        Weekday::Sat => "星期六",
        Weekday::Sun => "星期日",
    };
    format!("{}年{}月{}日 {}", date.year(), date.month(), date.day(), weekday)
}

pub fn build_prompt(topic: &str, today: &str) -> String {
    format!(
        r#"
Context: Today is {today}.
Task: Search for the latest and most relevant news regarding: "{topic}" in Taiwan (or related to Taiwan).
Constraint: Summarize the top 5-8 distinct stories in Traditional Chinese (Taiwan standard usage, zh-TW).
Requirement:
1. Focus on local Taiwanese perspectives and accurate terminology.
2. Format the output with Markdown. Use bolding for headlines.
3. Do not use JSON formatting in the text response, just clean readable Markdown.
4. Ensure the news is strictly current relative to today's date; do not include outdated stories.
"#
    )
}

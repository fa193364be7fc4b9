/// Request outcomes and aggregate statistics.
use serde::{Deserialize, Serialize};

/// Sentinel recorded on an aggregate with zero successful outcomes.
pub const ALL_REQUESTS_FAILED: &str = "all requests failed";

/// Result of one dispatched prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOutcome {
    /// Success status.
    pub success: bool,
    /// Wall-clock latency in seconds.
    pub latency_secs: f64,
    /// Character length of the dispatched prompt.
    pub prompt_chars: usize,
    /// Approximate completion token count (if successful).
    pub output_tokens: Option<usize>,
    /// Derived throughput in tokens per second (if successful).
    pub tokens_per_second: Option<f64>,
    /// Error message (if failed).
    pub error: Option<String>,
}

impl RequestOutcome {
    pub fn success(
        latency_secs: f64,
        prompt_chars: usize,
        output_tokens: usize,
        tokens_per_second: f64,
    ) -> Self {
        Self {
            success: true,
            latency_secs,
            prompt_chars,
            output_tokens: Some(output_tokens),
            tokens_per_second: Some(tokens_per_second),
            error: None,
        }
    }

    pub fn failure(latency_secs: f64, prompt_chars: usize, error: String) -> Self {
        Self {
            success: false,
            latency_secs,
            prompt_chars,
            output_tokens: None,
            tokens_per_second: None,
            error: Some(error),
        }
    }
}

/// Approximate the token count of a completion from its character length.
///
/// This is the usual characters-divided-by-four heuristic, not a tokenizer;
/// derived throughput numbers are directional only.
pub fn approx_output_tokens(content: &str) -> usize {
    content.chars().count() / 4
}

/// Summary statistics over one sample set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatSummary {
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
}

impl StatSummary {
    /// Compute summary statistics; `None` for an empty sample set rather than
    /// attempting percentile math on nothing.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

        Some(Self {
            mean,
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Nearest-rank percentile over a pre-sorted, non-empty sample.
fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    let clamped = quantile.clamp(0.0, 1.0);
    let idx = ((sorted.len() - 1) as f64 * clamped).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Summary of one test invocation.
///
/// Statistics are computed only over successful outcomes; failed outcomes
/// contribute solely to `failed_requests`. With zero successes the stat fields
/// are absent and `error` carries the all-failed sentinel, so callers always
/// inspect one uniform result type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    /// Latency statistics in seconds, over successful outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_secs: Option<StatSummary>,
    /// Throughput statistics in tokens/second, over successful outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_per_second: Option<StatSummary>,
    /// Approximate output token counts, over successful outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<StatSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AggregateReport {
    /// Fold a set of outcomes into a report.
    pub fn from_outcomes(outcomes: &[RequestOutcome]) -> Self {
        let total_requests = outcomes.len();
        let successful: Vec<&RequestOutcome> = outcomes.iter().filter(|o| o.success).collect();
        let successful_requests = successful.len();
        let failed_requests = total_requests - successful_requests;

        if successful.is_empty() {
            return Self {
                total_requests,
                successful_requests,
                failed_requests,
                latency_secs: None,
                tokens_per_second: None,
                output_tokens: None,
                error: Some(ALL_REQUESTS_FAILED.to_string()),
            };
        }

        let latencies: Vec<f64> = successful.iter().map(|o| o.latency_secs).collect();
        let throughputs: Vec<f64> = successful
            .iter()
            .filter_map(|o| o.tokens_per_second)
            .collect();
        let token_counts: Vec<f64> = successful
            .iter()
            .filter_map(|o| o.output_tokens.map(|t| t as f64))
            .collect();

        Self {
            total_requests,
            successful_requests,
            failed_requests,
            latency_secs: StatSummary::from_samples(&latencies),
            tokens_per_second: StatSummary::from_samples(&throughputs),
            output_tokens: StatSummary::from_samples(&token_counts),
            error: None,
        }
    }

    /// True when the report carries the all-failed sentinel (including the
    /// empty-outcome case).
    pub fn all_failed(&self) -> bool {
        self.error.as_deref() == Some(ALL_REQUESTS_FAILED)
    }
}

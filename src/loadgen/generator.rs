/// Load generator driving prompt traffic against one backend client.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use tokio::time::sleep;

use crate::config::TestConfig;
use crate::error::AppError;
use crate::http::client::{ChatClient, CompletionRequest};
use crate::loadgen::persist;
use crate::loadgen::report::{approx_output_tokens, AggregateReport, RequestOutcome};

/// Drives prompt traffic under a batched or sustained shape and folds the
/// outcomes into an aggregate report.
///
/// Holds an immutable configuration snapshot and one shared client instance;
/// the client must tolerate concurrent calls (see [`ChatClient`]).
pub struct LoadGenerator<C: ChatClient> {
    config: TestConfig,
    client: Arc<C>,
}

impl<C: ChatClient + 'static> LoadGenerator<C> {
    pub fn new(config: TestConfig, client: Arc<C>) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    fn request_for(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            system_prompt: self.config.system_prompt.clone().unwrap_or_default(),
            prompt: prompt.to_string(),
            sampling: self.config.sampling,
        }
    }

    /// Dispatch a single prompt and record its outcome.
    ///
    /// Single-shot: any client error is captured into a failed outcome, never
    /// retried and never escalated.
    pub async fn dispatch_one(&self, prompt: &str) -> RequestOutcome {
        let request = self.request_for(prompt);
        let prompt_chars = prompt.chars().count();
        Self::execute(Arc::clone(&self.client), request, prompt_chars).await
    }

    async fn execute(
        client: Arc<C>,
        request: CompletionRequest,
        prompt_chars: usize,
    ) -> RequestOutcome {
        let start = Instant::now();

        match client.complete(&request).await {
            Ok(response) => {
                let latency_secs = start.elapsed().as_secs_f64();
                let output_tokens = approx_output_tokens(&response.content);
                let tokens_per_second = if latency_secs > 0.0 {
                    output_tokens as f64 / latency_secs
                } else {
                    0.0
                };
                RequestOutcome::success(latency_secs, prompt_chars, output_tokens, tokens_per_second)
            }
            Err(e) => {
                let latency_secs = start.elapsed().as_secs_f64();
                RequestOutcome::failure(latency_secs, prompt_chars, e.to_string())
            }
        }
    }

    /// Batched latency test: issue `prompts` in consecutive chunks of
    /// `concurrency`, waiting for each chunk to finish before the next starts.
    ///
    /// Outcomes come back index-aligned with the input prompts regardless of
    /// completion order. An empty prompt list yields the zero-count aggregate
    /// without dispatching anything.
    pub async fn run_batched(
        &self,
        prompts: &[String],
        concurrency: usize,
    ) -> Result<AggregateReport, AppError> {
        self.run_batched_with_progress(prompts, concurrency, None)
            .await
    }

    /// [`run_batched`](Self::run_batched) with an optional progress bar.
    pub async fn run_batched_with_progress(
        &self,
        prompts: &[String],
        concurrency: usize,
        progress_bar: Option<Arc<ProgressBar>>,
    ) -> Result<AggregateReport, AppError> {
        let outcomes = self
            .batched_outcomes(prompts, concurrency, progress_bar)
            .await?;
        Ok(AggregateReport::from_outcomes(&outcomes))
    }

    /// Dispatch `prompts` in concurrency-bounded chunks and return the raw
    /// outcomes, index-aligned with the input.
    pub async fn batched_outcomes(
        &self,
        prompts: &[String],
        concurrency: usize,
        progress_bar: Option<Arc<ProgressBar>>,
    ) -> Result<Vec<RequestOutcome>, AppError> {
        if concurrency == 0 {
            return Err(AppError::Config(
                "concurrency must be greater than zero".to_string(),
            ));
        }

        let mut outcomes: Vec<RequestOutcome> = Vec::with_capacity(prompts.len());

        for chunk in prompts.chunks(concurrency) {
            // Fan out one task per prompt in the chunk, then fan in by
            // awaiting the handles in input order. The barrier between chunks
            // is the completion of every handle in this loop body.
            let handles: Vec<_> = chunk
                .iter()
                .map(|prompt| {
                    let client = Arc::clone(&self.client);
                    let request = self.request_for(prompt);
                    let prompt_chars = prompt.chars().count();
                    tokio::spawn(
                        async move { Self::execute(client, request, prompt_chars).await },
                    )
                })
                .collect();

            for (handle, prompt) in handles.into_iter().zip(chunk) {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => RequestOutcome::failure(
                        0.0,
                        prompt.chars().count(),
                        format!("Task join error: {}", e),
                    ),
                };

                if let Some(ref pb) = progress_bar {
                    pb.inc(1);
                    let successes = outcomes.iter().filter(|o| o.success).count()
                        + usize::from(outcome.success);
                    let failures = outcomes.len() + 1 - successes;
                    pb.set_message(format!("Success: {} | Failed: {}", successes, failures));
                }

                outcomes.push(outcome);
            }
        }

        if let Some(ref pb) = progress_bar {
            pb.finish_with_message("Load test completed");
        }

        Ok(outcomes)
    }

    /// Sustained-rate test: repeat `prompt` at a target `requests_per_second`
    /// for `duration`, strictly one request in flight at a time.
    ///
    /// The pacing is best-effort: the loop sleeps the remainder of the
    /// inter-request interval after each dispatch, so a slow request degrades
    /// the achieved rate instead of queuing. The request in flight when the
    /// deadline passes still completes and is counted.
    pub async fn run_sustained(
        &self,
        prompt: &str,
        requests_per_second: f64,
        duration: Duration,
    ) -> Result<AggregateReport, AppError> {
        if requests_per_second <= 0.0 {
            return Err(AppError::Config(
                "requests_per_second must be greater than zero".to_string(),
            ));
        }

        let interval = Duration::from_secs_f64(1.0 / requests_per_second);
        let start = Instant::now();
        let mut outcomes = Vec::new();

        while start.elapsed() < duration {
            let before_request = Instant::now();
            let outcome = self.dispatch_one(prompt).await;
            outcomes.push(outcome);

            let spent = before_request.elapsed();
            if let Some(wait) = interval.checked_sub(spent) {
                sleep(wait).await;
            }
        }

        Ok(AggregateReport::from_outcomes(&outcomes))
    }

    /// Persist a report to the configured output directory as
    /// `{test_name}_{YYYYMMDD_HHMMSS}.json`; no-op when no directory is
    /// configured. Write failures propagate.
    pub fn persist(
        &self,
        report: &AggregateReport,
        test_name: &str,
    ) -> Result<Option<PathBuf>, AppError> {
        match &self.config.output_dir {
            Some(dir) => persist::write_report(dir, report, test_name).map(Some),
            None => Ok(None),
        }
    }
}

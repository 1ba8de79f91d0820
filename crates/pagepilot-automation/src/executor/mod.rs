//! Action executor.
//!
//! Turns one [`Action`] into page operations against a [`Page`]. Every
//! wait is a bounded poll and every action runs under its class deadline,
//! so a site that never answers yields a typed failure instead of a hang.

mod stability;

pub use stability::{ResponseSample, StabilityTracker};

use std::time::Duration;

use pagepilot_config::{Config, PollingConfig, SelectorsConfig, TimeoutsConfig};
use pagepilot_protocol::{Action, ActionClass, ActionOutcome, ResponseBaseline};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::AutomationFailure;
use crate::page::{count_matches, first_match, matching_selector, soft, ElementRef, Page, PageError};
use crate::poll::{poll_until, PollPolicy, Polled};
use crate::resolve::ImageResolver;

/// Executes actions against a single page.
pub struct ActionExecutor {
    selectors: SelectorsConfig,
    polling: PollingConfig,
    timeouts: TimeoutsConfig,
    resolver: ImageResolver,
}

impl ActionExecutor {
    pub fn new(config: &Config) -> Self {
        Self {
            selectors: config.selectors.clone(),
            polling: config.polling.clone(),
            timeouts: config.timeouts.clone(),
            resolver: ImageResolver::new(config),
        }
    }

    /// Deadline for an action class.
    pub fn deadline(&self, class: ActionClass) -> Duration {
        Duration::from_millis(match class {
            ActionClass::Prepare => self.timeouts.prepare_ms,
            ActionClass::Submit => self.timeouts.submit_ms,
            ActionClass::AwaitResponse => self.timeouts.await_response_ms,
            ActionClass::ExtractImage => self.timeouts.extract_image_ms,
        })
    }

    /// Run `action` under its class deadline.
    pub async fn execute(
        &self,
        page: &dyn Page,
        action: Action,
    ) -> Result<ActionOutcome, AutomationFailure> {
        let class = action.class();
        let deadline = self.deadline(class);
        debug!(%class, "Executing action");

        match tokio::time::timeout(deadline, self.run(page, action)).await {
            Ok(result) => result,
            Err(_) => Err(AutomationFailure::Timeout {
                class,
                timeout_ms: deadline.as_millis() as u64,
            }),
        }
    }

    async fn run(&self, page: &dyn Page, action: Action) -> Result<ActionOutcome, AutomationFailure> {
        match action {
            Action::PrepareInterface {} => self.prepare(page).await,
            Action::SubmitPrompt { text } => self.submit(page, &text).await,
            Action::AwaitResponse { baseline } => self.await_response(page, baseline).await,
            Action::ExtractImage { known_url } => self
                .resolver
                .resolve(page, known_url.as_deref())
                .await
                .map(ActionOutcome::Image),
        }
    }

    async fn prepare(&self, page: &dyn Page) -> Result<ActionOutcome, AutomationFailure> {
        let selectors = self.selectors.prompt_input.as_slice();
        let policy = PollPolicy::new(
            self.polling.interval(),
            Duration::from_millis(self.polling.prepare_wait_ms),
        );

        let polled = poll_until(policy, move || async move {
            Ok::<_, PageError>(soft(first_match(page, selectors).await)?.flatten())
        })
        .await?;

        match polled {
            Polled::Ready(input) => {
                debug!(%input, "Prompt input ready");
                Ok(ActionOutcome::Ready {})
            }
            Polled::TimedOut { attempts, .. } => Err(AutomationFailure::InterfaceNotReady(format!(
                "no prompt input after {} probes of [{}]",
                attempts,
                selectors.join(", ")
            ))),
        }
    }

    async fn submit(&self, page: &dyn Page, text: &str) -> Result<ActionOutcome, AutomationFailure> {
        let baseline = ResponseBaseline {
            assistant_messages: count_matches(page, &self.selectors.assistant_message).await?,
            images: count_matches(page, &self.selectors.generated_image).await?,
        };

        let input = first_match(page, &self.selectors.prompt_input)
            .await?
            .ok_or_else(|| {
                AutomationFailure::InterfaceNotReady("prompt input is not on the page".to_string())
            })?;
        page.set_content(&input, text).await?;
        page.dispatch_input(&input).await?;

        let selectors = self.selectors.submit_button.as_slice();
        let policy = PollPolicy::new(
            self.polling.interval(),
            Duration::from_millis(self.polling.submit_wait_ms),
        );
        let polled = poll_until(policy, move || async move {
            let Some(button) = soft(first_match(page, selectors).await)?.flatten() else {
                return Ok(None);
            };
            let enabled = soft(page.is_enabled(&button).await)?.unwrap_or(false);
            Ok::<_, PageError>(enabled.then_some(button))
        })
        .await?;

        let Polled::Ready(button) = polled else {
            return Err(AutomationFailure::ControlUnavailable(format!(
                "no enabled submit control among [{}]",
                selectors.join(", ")
            )));
        };
        page.click(&button).await?;

        info!(
            chars = text.chars().count(),
            assistant_messages = baseline.assistant_messages,
            "Prompt submitted"
        );
        Ok(ActionOutcome::Submitted { baseline })
    }

    async fn await_response(
        &self,
        page: &dyn Page,
        baseline: ResponseBaseline,
    ) -> Result<ActionOutcome, AutomationFailure> {
        let max_wait = Duration::from_millis(self.polling.response_max_wait_ms);
        let policy = PollPolicy::new(self.polling.interval(), max_wait);
        let tracker = &Mutex::new(StabilityTracker::new(self.polling.stable_samples));

        let polled = poll_until(policy, move || async move {
            let sample = self.sample_response(page, baseline).await?;
            let mut tracker = tracker.lock();
            Ok::<_, PageError>(match sample {
                Some(sample) => tracker.observe(sample),
                None => {
                    tracker.reset();
                    None
                }
            })
        })
        .await?;

        match polled {
            Polled::Ready(sample) => {
                debug!(
                    chars = sample.text.chars().count(),
                    attachments = sample.attachments.len(),
                    "Response stable"
                );
                Ok(ActionOutcome::Response {
                    text: sample.text,
                    attachments: sample.attachments,
                })
            }
            Polled::TimedOut { elapsed, .. } => Err(AutomationFailure::ResponseTimeout {
                waited_ms: elapsed.as_millis() as u64,
            }),
        }
    }

    /// Newest reply, or `None` while there is no new reply or it is still
    /// being generated.
    async fn sample_response(
        &self,
        page: &dyn Page,
        baseline: ResponseBaseline,
    ) -> Result<Option<ResponseSample>, PageError> {
        let found = soft(matching_selector(page, &self.selectors.assistant_message).await)?;
        let Some((selector, count)) = found.flatten() else {
            return Ok(None);
        };
        if count <= baseline.assistant_messages {
            return Ok(None);
        }
        let generating = soft(count_matches(page, &self.selectors.generating_indicator).await)?;
        if generating.unwrap_or(0) > 0 {
            return Ok(None);
        }

        let newest = ElementRef::new(selector, count - 1);
        let text = soft(page.text(&newest).await)?
            .flatten()
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        let attachments = self.new_image_sources(page, baseline.images).await?;

        if text.is_empty() && attachments.is_empty() {
            return Ok(None);
        }
        Ok(Some(ResponseSample { text, attachments }))
    }

    async fn new_image_sources(&self, page: &dyn Page, since: usize) -> Result<Vec<String>, PageError> {
        let found = soft(matching_selector(page, &self.selectors.generated_image).await)?;
        let Some((selector, count)) = found.flatten() else {
            return Ok(Vec::new());
        };

        let mut sources = Vec::new();
        for index in since..count {
            let image = ElementRef::new(selector.clone(), index);
            if let Some(src) = soft(page.attribute(&image, "src").await)?.flatten() {
                if !src.trim().is_empty() {
                    sources.push(src);
                }
            }
        }
        Ok(sources)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

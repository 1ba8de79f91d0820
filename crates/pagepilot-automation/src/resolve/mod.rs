//! Full-size image resolution.
//!
//! Generated images first render as thumbnails. The resolver walks an
//! ordered chain of strategies against the newest generated image and
//! stops at the first one that yields a different, durable reference:
//!
//! 1. full-size data attributes (or the largest `srcset` candidate)
//! 2. opening the lightbox and reading its image
//! 3. regex rewrite of the thumbnail URL
//! 4. the thumbnail itself, flagged degraded

mod report;

pub use report::{largest_srcset_candidate, ResolutionReport};

use std::time::Duration;

use pagepilot_config::Config;
use pagepilot_protocol::{ImageResolution, ResolutionStrategy};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::AutomationFailure;
use crate::page::{first_match, last_match, soft, ElementRef, Page, PageError};
use crate::poll::{poll_until, PollPolicy, Polled};

struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

/// Runs the resolution chain against a page.
pub struct ImageResolver {
    image_selectors: Vec<String>,
    trigger_selectors: Vec<String>,
    lightbox_selectors: Vec<String>,
    attributes: Vec<String>,
    rules: Vec<RewriteRule>,
    interval: Duration,
    strategy_wait: Duration,
    interaction_wait: Duration,
}

impl ImageResolver {
    /// Build from configuration. Rules whose pattern does not compile are
    /// skipped; config validation reports them before startup.
    pub fn new(config: &Config) -> Self {
        let rules = config
            .resolution
            .rewrite_rules
            .iter()
            .filter_map(|rule| match Regex::new(&rule.pattern) {
                Ok(pattern) => Some(RewriteRule {
                    pattern,
                    replacement: rule.replacement.clone(),
                }),
                Err(e) => {
                    warn!("Skipping rewrite rule {:?}: {}", rule.pattern, e);
                    None
                }
            })
            .collect();

        Self {
            image_selectors: config.selectors.generated_image.clone(),
            trigger_selectors: config.selectors.full_size_trigger.clone(),
            lightbox_selectors: config.selectors.full_size_image.clone(),
            attributes: config.resolution.full_size_attributes.clone(),
            rules,
            interval: config.polling.interval(),
            strategy_wait: Duration::from_millis(config.resolution.strategy_wait_ms),
            interaction_wait: Duration::from_millis(config.resolution.interaction_wait_ms),
        }
    }

    /// Resolve the newest generated image, falling back to `known_url` when
    /// the page shows none.
    pub async fn resolve(
        &self,
        page: &dyn Page,
        known_url: Option<&str>,
    ) -> Result<ImageResolution, AutomationFailure> {
        let image = self.locate_image(page).await;
        let original = image
            .as_ref()
            .map(|(_, src)| src.clone())
            .or_else(|| known_url.filter(|u| !u.trim().is_empty()).map(str::to_string))
            .ok_or_else(|| {
                AutomationFailure::ResolutionFailed(
                    "no generated image on the page and no known url".to_string(),
                )
            })?;
        let element = image.as_ref().map(|(el, _)| el);

        let mut report = ResolutionReport::default();
        for strategy in [
            ResolutionStrategy::Attribute,
            ResolutionStrategy::Interaction,
            ResolutionStrategy::UrlRewrite,
        ] {
            let attempt = match strategy {
                ResolutionStrategy::Attribute => self.by_attribute(page, element, &original).await,
                ResolutionStrategy::Interaction => {
                    self.by_interaction(page, element, &original).await
                }
                _ => self.by_rewrite(&original),
            };

            match attempt {
                Ok(url) => {
                    debug!(%strategy, url = %url, "Resolution strategy succeeded");
                    report.hit(strategy, format!("resolved to {}", url));
                    return Ok(report.finish(original, url, strategy));
                }
                Err(reason) => {
                    debug!(%strategy, %reason, "Resolution strategy missed");
                    report.miss(strategy, reason);
                }
            }
        }

        warn!(url = %original, "Falling back to raw image reference");
        report.hit(
            ResolutionStrategy::RawFallback,
            "using the thumbnail reference as is",
        );
        Ok(report.finish(original.clone(), original, ResolutionStrategy::RawFallback))
    }

    /// Newest generated image element and its current `src`.
    async fn locate_image(&self, page: &dyn Page) -> Option<(ElementRef, String)> {
        let selectors = self.image_selectors.as_slice();
        let policy = PollPolicy::new(self.interval, self.strategy_wait);
        let polled: Result<Polled<(ElementRef, String)>, PageError> =
            poll_until(policy, move || async move {
                let Some(image) = soft(last_match(page, selectors).await)?.flatten() else {
                    return Ok(None);
                };
                let src = soft(page.attribute(&image, "src").await)?.flatten();
                Ok::<_, PageError>(src.filter(|s| !s.trim().is_empty()).map(|s| (image, s)))
            })
            .await;

        match polled {
            Ok(found) => found.ready(),
            Err(e) => {
                debug!("Could not locate generated image: {}", e);
                None
            }
        }
    }

    async fn by_attribute(
        &self,
        page: &dyn Page,
        image: Option<&ElementRef>,
        original: &str,
    ) -> Result<String, String> {
        let image = image.ok_or("no generated image element")?;
        let attributes = self.attributes.as_slice();
        let policy = PollPolicy::new(self.interval, self.strategy_wait);

        let polled: Result<Polled<String>, PageError> = poll_until(policy, move || async move {
            for name in attributes {
                let value = soft(page.attribute(image, name).await)?.flatten();
                if let Some(url) = value.filter(|v| usable(v, original)) {
                    return Ok(Some(url));
                }
            }
            let srcset = soft(page.attribute(image, "srcset").await)?.flatten();
            Ok::<_, PageError>(
                srcset
                    .and_then(|s| largest_srcset_candidate(&s))
                    .filter(|u| usable(u, original)),
            )
        })
        .await;

        polled
            .map_err(|e| e.to_string())?
            .ready()
            .ok_or_else(|| format!("no full-size attribute among [{}]", self.attributes.join(", ")))
    }

    async fn by_interaction(
        &self,
        page: &dyn Page,
        image: Option<&ElementRef>,
        original: &str,
    ) -> Result<String, String> {
        let image = image.ok_or("no generated image element")?;
        let target = first_match(page, &self.trigger_selectors)
            .await
            .map_err(|e| e.to_string())?
            .unwrap_or_else(|| image.clone());
        page.click(&target).await.map_err(|e| e.to_string())?;

        let lightbox = self.lightbox_selectors.as_slice();
        let policy = PollPolicy::new(self.interval, self.interaction_wait);
        let polled: Result<Polled<String>, PageError> = poll_until(policy, move || async move {
            let Some(full) = soft(last_match(page, lightbox).await)?.flatten() else {
                return Ok(None);
            };
            let src = soft(page.attribute(&full, "src").await)?.flatten();
            Ok::<_, PageError>(src.filter(|s| usable(s, original)))
        })
        .await;

        if let Err(e) = page.press_key("Escape").await {
            debug!("Failed to dismiss lightbox: {}", e);
        }

        polled
            .map_err(|e| e.to_string())?
            .ready()
            .ok_or_else(|| format!("no full-size image after clicking {}", target))
    }

    fn by_rewrite(&self, original: &str) -> Result<String, String> {
        for rule in &self.rules {
            if !rule.pattern.is_match(original) {
                continue;
            }
            let rewritten = rule
                .pattern
                .replace(original, rule.replacement.as_str())
                .into_owned();
            if usable(&rewritten, original) {
                return Ok(rewritten);
            }
        }
        Err(format!("none of {} rewrite rules changed the url", self.rules.len()))
    }
}

fn usable(candidate: &str, original: &str) -> bool {
    let candidate = candidate.trim();
    !candidate.is_empty() && candidate != original
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;

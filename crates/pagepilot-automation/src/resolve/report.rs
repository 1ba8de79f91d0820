//! Per-run record of which strategies ran and how they ended.

use pagepilot_protocol::{ImageResolution, ResolutionStrategy, StrategyAttempt};

#[derive(Debug, Default, Clone)]
pub struct ResolutionReport {
    attempts: Vec<StrategyAttempt>,
}

impl ResolutionReport {
    pub fn hit(&mut self, strategy: ResolutionStrategy, detail: impl Into<String>) {
        self.push(strategy, true, detail.into());
    }

    pub fn miss(&mut self, strategy: ResolutionStrategy, detail: impl Into<String>) {
        self.push(strategy, false, detail.into());
    }

    /// Seal the report into the outcome of the strategy that succeeded.
    pub fn finish(
        self,
        original_url: String,
        resolved_url: String,
        strategy: ResolutionStrategy,
    ) -> ImageResolution {
        ImageResolution {
            original_url,
            resolved_url,
            strategy,
            degraded: strategy == ResolutionStrategy::RawFallback,
            attempts: self.attempts,
        }
    }

    fn push(&mut self, strategy: ResolutionStrategy, succeeded: bool, detail: String) {
        self.attempts.push(StrategyAttempt {
            strategy,
            succeeded,
            detail,
        });
    }
}

/// Largest candidate of a `srcset` attribute, by width or density descriptor.
pub fn largest_srcset_candidate(srcset: &str) -> Option<String> {
    srcset
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            let weight = parts
                .next()
                .and_then(|d| d.strip_suffix('w').or_else(|| d.strip_suffix('x')))
                .and_then(|n| n.parse::<f64>().ok())
                .unwrap_or(1.0);
            Some((url.to_string(), weight))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(url, _)| url)
}

//! Detects when a streamed reply has stopped changing.

/// One observation of the newest reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSample {
    pub text: String,
    pub attachments: Vec<String>,
}

/// Counts consecutive identical samples.
#[derive(Debug)]
pub struct StabilityTracker {
    required: u32,
    last: Option<ResponseSample>,
    repeats: u32,
}

impl StabilityTracker {
    pub fn new(required: u32) -> Self {
        Self {
            required: required.max(1),
            last: None,
            repeats: 0,
        }
    }

    /// Feed a sample; returns it once it has been seen `required` times in a row.
    pub fn observe(&mut self, sample: ResponseSample) -> Option<ResponseSample> {
        if self.last.as_ref() == Some(&sample) {
            self.repeats += 1;
        } else {
            self.last = Some(sample);
            self.repeats = 1;
        }

        if self.repeats >= self.required {
            self.last.clone()
        } else {
            None
        }
    }

    /// Forget progress, e.g. while the site is still generating.
    pub fn reset(&mut self) {
        self.last = None;
        self.repeats = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(text: &str) -> ResponseSample {
        ResponseSample {
            text: text.to_string(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_stable_after_required_repeats() {
        let mut tracker = StabilityTracker::new(3);
        assert!(tracker.observe(sample("h")).is_none());
        assert!(tracker.observe(sample("hi")).is_none());
        assert!(tracker.observe(sample("hi")).is_none());
        assert_eq!(tracker.observe(sample("hi")), Some(sample("hi")));
    }

    #[test]
    fn test_change_restarts_count() {
        let mut tracker = StabilityTracker::new(2);
        assert!(tracker.observe(sample("a")).is_none());
        assert!(tracker.observe(sample("ab")).is_none());
        tracker.reset();
        assert!(tracker.observe(sample("ab")).is_none());
        assert!(tracker.observe(sample("ab")).is_some());
    }
}

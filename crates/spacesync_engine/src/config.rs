//! Configuration for a push run.

use crate::error::EngineError;
use std::time::Duration;

/// Limits for one batched ID query.
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    /// Maximum serialized length of one batch in characters, kept under
    /// common URL length ceilings.
    pub char_limit: usize,
    /// Maximum number of IDs per batch.
    pub item_limit: usize,
}

impl BatchLimits {
    /// Sets the character limit.
    pub fn with_char_limit(mut self, limit: usize) -> Self {
        self.char_limit = limit;
        self
    }

    /// Sets the item count limit.
    pub fn with_item_limit(mut self, limit: usize) -> Self {
        self.item_limit = limit;
        self
    }
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            char_limit: 1990,
            item_limit: 100,
        }
    }
}

/// Rate policy for the publish queue.
///
/// Publishing runs strictly sequential with a fixed post-call delay because
/// the destination enforces per-second rate limits and publish order matters
/// for link resolution within a pass.
#[derive(Debug, Clone, Copy)]
pub struct PublishPolicy {
    /// Delay inserted after each publish call.
    pub delay: Duration,
}

impl PublishPolicy {
    /// Sets the post-call delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// A policy with no delay, for tests and local destinations.
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
        }
    }
}

/// Options for a full push run.
#[derive(Debug, Clone)]
pub struct PushOptions {
    /// Push only content types and locales.
    pub content_model_only: bool,
    /// Push only entries and assets, leaving the content model untouched.
    pub skip_content_model: bool,
    /// Skip locales (only valid together with `content_model_only`).
    pub skip_locales: bool,
    /// Create content but do not publish it.
    pub skip_content_publishing: bool,
    /// Wait between creating a batch and publishing it.
    pub pre_publish_delay: Duration,
    /// Delay after each publish call.
    pub publish_delay: Duration,
    /// Concurrency cap for asset processing.
    pub asset_concurrency: usize,
    /// Concurrency cap for editor interface fetch/update fan-out.
    pub editor_interface_concurrency: usize,
    /// Limits for batched destination ID queries.
    pub batch: BatchLimits,
}

impl PushOptions {
    /// Pushes only the content model.
    pub fn with_content_model_only(mut self, value: bool) -> Self {
        self.content_model_only = value;
        self
    }

    /// Skips the content model.
    pub fn with_skip_content_model(mut self, value: bool) -> Self {
        self.skip_content_model = value;
        self
    }

    /// Skips locales.
    pub fn with_skip_locales(mut self, value: bool) -> Self {
        self.skip_locales = value;
        self
    }

    /// Creates content without publishing it.
    pub fn with_skip_content_publishing(mut self, value: bool) -> Self {
        self.skip_content_publishing = value;
        self
    }

    /// Sets the pre-publish delay.
    pub fn with_pre_publish_delay(mut self, delay: Duration) -> Self {
        self.pre_publish_delay = delay;
        self
    }

    /// Sets the per-publish delay.
    pub fn with_publish_delay(mut self, delay: Duration) -> Self {
        self.publish_delay = delay;
        self
    }

    /// Sets the batch limits for snapshot queries.
    pub fn with_batch(mut self, batch: BatchLimits) -> Self {
        self.batch = batch;
        self
    }

    /// Rejects mutually exclusive option combinations.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.content_model_only && self.skip_content_model {
            return Err(EngineError::InvalidOptions(
                "content_model_only and skip_content_model cannot be used together".into(),
            ));
        }
        if self.skip_locales && !self.content_model_only {
            return Err(EngineError::InvalidOptions(
                "skip_locales can only be used together with content_model_only".into(),
            ));
        }
        Ok(())
    }

    /// The publish rate policy derived from these options.
    pub fn publish_policy(&self) -> PublishPolicy {
        PublishPolicy {
            delay: self.publish_delay,
        }
    }
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            content_model_only: false,
            skip_content_model: false,
            skip_locales: false,
            skip_content_publishing: false,
            pre_publish_delay: Duration::ZERO,
            publish_delay: Duration::from_millis(500),
            asset_concurrency: 4,
            editor_interface_concurrency: 6,
            batch: BatchLimits::default(),
        }
    }
}

/// Options for fetching the destination snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotOptions {
    /// Skip content types and locales.
    pub skip_content_model: bool,
    /// Skip entries and assets.
    pub skip_content: bool,
    /// Limits for batched ID queries.
    pub batch: BatchLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let limits = BatchLimits::default();
        assert_eq!(limits.char_limit, 1990);
        assert_eq!(limits.item_limit, 100);

        let options = PushOptions::default();
        assert_eq!(options.publish_delay, Duration::from_millis(500));
        assert_eq!(options.asset_concurrency, 4);
        assert_eq!(options.editor_interface_concurrency, 6);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn conflicting_options_rejected() {
        let conflict = PushOptions::default()
            .with_content_model_only(true)
            .with_skip_content_model(true);
        assert!(matches!(
            conflict.validate(),
            Err(EngineError::InvalidOptions(_))
        ));

        let stray_skip_locales = PushOptions::default().with_skip_locales(true);
        assert!(matches!(
            stray_skip_locales.validate(),
            Err(EngineError::InvalidOptions(_))
        ));

        let valid = PushOptions::default()
            .with_content_model_only(true)
            .with_skip_locales(true);
        assert!(valid.validate().is_ok());
    }
}

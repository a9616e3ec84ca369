use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct CmgOptions {
    /// How long to wait for a submitted command to commit.
    pub submit_timeout: Option<Duration>,
    /// How many times an unknown leader gets refreshed before giving up.
    pub leader_refresh_attempts: Option<usize>,
    /// Delay between consecutive leader refreshes. A random jitter of up to the same amount is added.
    pub leader_refresh_backoff: Option<Duration>,
    /// Validation tokens older than this get expired by the leader's watchdog.
    pub validation_timeout: Option<Duration>,
    /// How often the watchdog looks for expired validation tokens.
    pub validation_sweep_interval: Option<Duration>,
    /// Product version reported in JoinRequest and in initial cluster states.
    pub product_version: Option<String>,
}

pub(super) struct CmgOptionsValidated {
    pub submit_timeout: Duration,
    pub leader_refresh_attempts: usize,
    pub leader_refresh_backoff: Duration,
    pub validation_timeout: Duration,
    pub validation_sweep_interval: Duration,
    pub product_version: String,
}

impl CmgOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.submit_timeout == Duration::from_millis(0) {
            return Err("Submit timeout must be positive");
        }
        if self.leader_refresh_attempts == 0 {
            return Err("Leader must be refreshed at least once");
        }
        if self.validation_sweep_interval == Duration::from_millis(0) {
            return Err("Validation sweep interval must be positive");
        }
        if self.validation_sweep_interval >= self.validation_timeout {
            return Err("Validation sweep interval must be less than the validation timeout");
        }
        if self.product_version.is_empty() {
            return Err("Product version must not be empty");
        }

        Ok(())
    }
}

impl TryFrom<CmgOptions> for CmgOptionsValidated {
    type Error = &'static str;

    fn try_from(options: CmgOptions) -> Result<Self, Self::Error> {
        let values = CmgOptionsValidated {
            submit_timeout: options.submit_timeout.unwrap_or(Duration::from_secs(5)),
            leader_refresh_attempts: options.leader_refresh_attempts.unwrap_or(3),
            leader_refresh_backoff: options.leader_refresh_backoff.unwrap_or(Duration::from_millis(50)),
            validation_timeout: options.validation_timeout.unwrap_or(Duration::from_secs(60)),
            validation_sweep_interval: options.validation_sweep_interval.unwrap_or(Duration::from_secs(5)),
            product_version: options
                .product_version
                .unwrap_or_else(|| super::CURRENT_VERSION.to_string()),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let validated = CmgOptionsValidated::try_from(CmgOptions::default()).unwrap();

        assert_eq!(validated.leader_refresh_attempts, 3);
        assert_eq!(validated.product_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn sweep_interval_must_be_below_timeout() {
        let options = CmgOptions {
            validation_timeout: Some(Duration::from_secs(1)),
            validation_sweep_interval: Some(Duration::from_secs(1)),
            ..CmgOptions::default()
        };

        assert!(CmgOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn zero_refresh_attempts_are_rejected() {
        let options = CmgOptions {
            leader_refresh_attempts: Some(0),
            ..CmgOptions::default()
        };

        assert!(CmgOptionsValidated::try_from(options).is_err());
    }
}

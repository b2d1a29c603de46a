use crate::config::DownloadConfig;
use crate::index::FileRecord;

/// Decision for a file that is missing locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again; `number` is the 1-based budgeted attempt about to be made.
    Attempt { number: u32 },
    /// Budget spent; skip until an operator reset.
    Exhausted,
}

/// Per-file attempt budget across all runs.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of budgeted attempts (including the first).
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &DownloadConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
        }
    }

    pub fn decide(&self, rec: &FileRecord) -> RetryDecision {
        let used = rec.budget_used();
        if used >= self.max_attempts {
            RetryDecision::Exhausted
        } else {
            RetryDecision::Attempt { number: used + 1 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::now;

    #[test]
    fn respects_max_attempts() {
        let p = RetryPolicy { max_attempts: 3 };
        let mut rec = FileRecord::new("u", 1, now());
        assert_eq!(p.decide(&rec), RetryDecision::Attempt { number: 1 });
        rec.attempts = 2;
        assert_eq!(p.decide(&rec), RetryDecision::Attempt { number: 3 });
        rec.attempts = 3;
        assert_eq!(p.decide(&rec), RetryDecision::Exhausted);
        rec.attempts = 7;
        assert_eq!(p.decide(&rec), RetryDecision::Exhausted);
    }

    #[test]
    fn auth_retries_do_not_count() {
        let p = RetryPolicy { max_attempts: 3 };
        let mut rec = FileRecord::new("u", 1, now());
        rec.attempts = 4;
        rec.auth_retries = 2;
        assert_eq!(p.decide(&rec), RetryDecision::Attempt { number: 3 });
    }

    #[test]
    fn zero_budget_never_attempts() {
        let p = RetryPolicy { max_attempts: 0 };
        let rec = FileRecord::new("u", 1, now());
        assert_eq!(p.decide(&rec), RetryDecision::Exhausted);
    }
}

use serde::{Deserialize, Serialize};

use crate::domain::JobOutcome;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub files: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub encrypted: u64,
    pub decrypted: u64,
    pub bytes_processed: u64,
}

impl BatchStats {
    pub fn from_outcomes(outcomes: &[JobOutcome]) -> Self {
        let mut s = Self::default();
        for o in outcomes {
            s.files += 1;
            s.bytes_processed += o.bytes_processed;
            if o.success() {
                s.succeeded += 1;
                match o.mode {
                    crate::domain::JobMode::Encrypt => s.encrypted += 1,
                    crate::domain::JobMode::Decrypt => s.decrypted += 1,
                }
            } else {
                s.failed += 1;
            }
        }
        s
    }
}

//! Record of a completed walk.

use serde::Serialize;

use crate::chambers::Chamber;

/// One executed chamber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub chamber: Chamber,
    /// Identifier (or username, for chamber 0) the chamber consumed.
    pub input: String,
    pub elapsed_ms: u64,
}

/// Everything a walk produced, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    pub steps: Vec<StepRecord>,
    pub final_message: String,
}

impl WalkReport {
    pub fn total_elapsed_ms(&self) -> u64 {
        self.steps.iter().map(|s| s.elapsed_ms).sum()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_chambers_by_name() {
        let report = WalkReport {
            steps: vec![StepRecord {
                index: 5,
                chamber: Chamber::Yap,
                input: "abc".to_string(),
                elapsed_ms: 12,
            }],
            final_message: "done".to_string(),
        };

        let value: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["steps"][0]["chamber"], "yap");
        assert_eq!(value["steps"][0]["index"], 5);
        assert_eq!(value["final_message"], "done");
    }

    #[test]
    fn total_elapsed_sums_steps() {
        let step = |ms| StepRecord {
            index: 0,
            chamber: Chamber::Handshake,
            input: String::new(),
            elapsed_ms: ms,
        };
        let report = WalkReport {
            steps: vec![step(3), step(4)],
            final_message: String::new(),
        };
        assert_eq!(report.total_elapsed_ms(), 7);
    }
}

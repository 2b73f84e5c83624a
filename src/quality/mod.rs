//! Post-hoc quality gates. Independent of the matching phases: they
//! consume counts produced downstream (verification, extraction) and
//! decide automatic-pass versus escalate-to-human. Gates never fail a
//! run by throwing; a bad outcome is just a `manual_review` status.

use serde::{Deserialize, Serialize};

/// Minimum TOC entries before a book is considered complete.
pub const MIN_TOC_ENTRIES: usize = 10;
/// Required share of songs passing downstream verification.
pub const VERIFICATION_THRESHOLD: f64 = 0.95;
/// Required share of songs actually extracted to output files.
pub const OUTPUT_THRESHOLD: f64 = 0.90;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Success,
    ManualReview,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    Failed,
    ManualReview,
}

/// Outcome of a single gate check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateReport {
    pub gate: String,
    pub passed: bool,
    pub status: GateStatus,
    pub metric_value: f64,
    pub threshold: f64,
    pub message: String,
    pub details: serde_json::Value,
}

/// Aggregate over all checked gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_status: OverallStatus,
    pub gates_checked: usize,
    pub gates_passed: usize,
    pub gates_failed: usize,
    pub failed_gates: Vec<String>,
    pub gates: Vec<GateReport>,
}

/// TOC completeness: enough entries to trust the book's TOC at all.
/// `allow_short_books` bypasses the check for legitimately small books.
pub fn check_toc_completeness(entry_count: usize, allow_short_books: bool) -> GateReport {
    let passed = entry_count >= MIN_TOC_ENTRIES || allow_short_books;
    let message = if passed {
        if entry_count < MIN_TOC_ENTRIES {
            format!("TOC has {entry_count} entries; short book explicitly allowed")
        } else {
            format!("TOC has {entry_count} entries")
        }
    } else {
        format!("TOC has only {entry_count} entries (minimum {MIN_TOC_ENTRIES})")
    };
    GateReport {
        gate: "toc_completeness".to_string(),
        passed,
        status: if passed {
            GateStatus::Success
        } else {
            GateStatus::ManualReview
        },
        metric_value: entry_count as f64,
        threshold: MIN_TOC_ENTRIES as f64,
        message,
        details: serde_json::json!({
            "entry_count": entry_count,
            "allow_short_books": allow_short_books,
        }),
    }
}

/// Verification rate over extracted songs. A total of zero is never a
/// success: with nothing verified there is no evidence either way.
pub fn check_verification_rate(verified: usize, total: usize) -> GateReport {
    rate_gate(
        "verification_rate",
        verified,
        total,
        VERIFICATION_THRESHOLD,
        "verified",
    )
}

/// Output rate: songs that actually made it to output files.
pub fn check_output_rate(extracted: usize, total: usize) -> GateReport {
    rate_gate("output_rate", extracted, total, OUTPUT_THRESHOLD, "extracted")
}

fn rate_gate(gate: &str, hits: usize, total: usize, threshold: f64, verb: &str) -> GateReport {
    let (passed, rate, message) = if total == 0 {
        (
            false,
            0.0,
            format!("no songs to check: 0 {verb} of 0"),
        )
    } else {
        let rate = hits as f64 / total as f64;
        (
            rate >= threshold,
            rate,
            format!("{hits} of {total} songs {verb} ({:.1}%)", rate * 100.0),
        )
    };
    GateReport {
        gate: gate.to_string(),
        passed,
        status: if passed {
            GateStatus::Success
        } else {
            GateStatus::ManualReview
        },
        metric_value: rate,
        threshold,
        message,
        details: serde_json::json!({ "count": hits, "total": total }),
    }
}

/// Aggregate: `manual_review` wins over `failed`, which wins over
/// `success`.
pub fn aggregate(gates: Vec<GateReport>) -> QualityReport {
    let overall_status = if gates
        .iter()
        .any(|g| g.status == GateStatus::ManualReview)
    {
        OverallStatus::ManualReview
    } else if gates.iter().any(|g| !g.passed) {
        OverallStatus::Failed
    } else {
        OverallStatus::Success
    };

    let gates_passed = gates.iter().filter(|g| g.passed).count();
    let failed_gates: Vec<String> = gates
        .iter()
        .filter(|g| !g.passed)
        .map(|g| g.message.clone())
        .collect();

    QualityReport {
        overall_status,
        gates_checked: gates.len(),
        gates_passed,
        gates_failed: gates.len() - gates_passed,
        failed_gates,
        gates,
    }
}

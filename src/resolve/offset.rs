//! Printed-page → document-page offset consensus.

use std::collections::HashMap;

/// Consensus offset with its agreement ratio. Zero samples means offset 0
/// at confidence 0.0, which downstream phases treat as "uncalibrated".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetEstimate {
    pub offset: i64,
    pub confidence: f32,
    pub samples: usize,
}

impl OffsetEstimate {
    pub fn uncalibrated() -> Self {
        Self {
            offset: 0,
            confidence: 0.0,
            samples: 0,
        }
    }
}

/// Estimate from accepted (toc_page, pdf_page) pairs. The consensus is the
/// most frequent `pdf_page - toc_page`; confidence is the share of samples
/// agreeing with it. Ties go to the smallest absolute offset, then the
/// smaller signed value, so the result is deterministic.
pub fn estimate(pairs: &[(u32, u32)]) -> OffsetEstimate {
    if pairs.is_empty() {
        return OffsetEstimate::uncalibrated();
    }

    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &(toc_page, pdf_page) in pairs {
        *counts.entry(pdf_page as i64 - toc_page as i64).or_default() += 1;
    }

    let mut best: Option<(i64, usize)> = None;
    for (&offset, &count) in &counts {
        best = Some(match best {
            None => (offset, count),
            Some((best_offset, best_count)) => {
                if count > best_count
                    || (count == best_count
                        && (offset.abs() < best_offset.abs()
                            || (offset.abs() == best_offset.abs() && offset < best_offset)))
                {
                    (offset, count)
                } else {
                    (best_offset, best_count)
                }
            }
        });
    }

    let (offset, agreeing) = best.unwrap_or((0, 0));
    OffsetEstimate {
        offset,
        confidence: agreeing as f32 / pairs.len() as f32,
        samples: pairs.len(),
    }
}

//! Mark-one decision engine
//!
//! Decides whether a page gets the supplementary "1" marker. The rule table
//! is keyed by dock code and evaluated as a priority-ordered decision list:
//! the first matching branch wins and exactly one region is extracted per
//! decision.
//!
//! The dock-specific branches use substring containment, which tolerates
//! extraction noise around the code; the default branch demands exactly one
//! non-empty line equal to a known standalone code, which avoids false
//! positives in that busier region. The asymmetry is deliberate policy.

use crate::error::Result;
use crate::record::clean_field;
use crate::regions::{self, Rect};

/// Standalone codes accepted by the default branch
pub const STANDALONE_CODES: [&str; 5] = ["PYW5", "PLMN", "PN4D", "PNYX", "PRU5"];

/// One branch of the mark-one rule table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkOneRule {
    /// Mark iff any needle occurs as a substring of the cleaned region text
    Substring {
        region: Rect,
        needles: &'static [&'static str],
    },
    /// Mark iff the region is exactly one non-empty trimmed line equal to one
    /// of the codes
    SingleCode {
        region: Rect,
        codes: &'static [&'static str],
    },
}

/// Resolve the rule for a dock code. First match wins, no fallthrough.
pub fn rule_for(dock_code: &str) -> MarkOneRule {
    match dock_code {
        "T8" => MarkOneRule::Substring {
            region: regions::TG83,
            needles: &["TG83"],
        },
        "A3" => MarkOneRule::Substring {
            region: regions::PART_NUMBER,
            needles: &["A70L", "A6S6"],
        },
        // Z1 reads the same part-number rectangle as A3, different pattern
        "Z1" => MarkOneRule::Substring {
            region: regions::PART_NUMBER,
            needles: &["Z001"],
        },
        _ => MarkOneRule::SingleCode {
            region: regions::OTHER_CODES,
            codes: &STANDALONE_CODES,
        },
    }
}

impl MarkOneRule {
    /// The single region this rule extracts from
    pub fn region(&self) -> Rect {
        match self {
            MarkOneRule::Substring { region, .. } => *region,
            MarkOneRule::SingleCode { region, .. } => *region,
        }
    }

    /// Evaluate the rule against raw region text. Empty text never matches.
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            MarkOneRule::Substring { needles, .. } => {
                let cleaned = clean_field(raw);
                needles.iter().any(|needle| cleaned.contains(needle))
            }
            MarkOneRule::SingleCode { codes, .. } => {
                let mut lines = raw.lines().map(str::trim).filter(|line| !line.is_empty());
                match (lines.next(), lines.next()) {
                    (Some(only), None) => codes.contains(&only),
                    _ => false,
                }
            }
        }
    }
}

/// Decide mark-one for a page: resolve the dock's rule, extract its region
/// on demand, and evaluate. Extraction failures propagate; extracted empty
/// text just means "no match".
pub fn decide<F>(dock_code: &str, extract: F) -> Result<bool>
where
    F: FnOnce(&Rect) -> Result<String>,
{
    let rule = rule_for(dock_code);
    let text = extract(&rule.region())?;
    Ok(rule.matches(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t8_marks_on_tg83_substring() {
        let marked = decide("T8", |_| Ok("SHIP TG83 PACK".to_string())).unwrap();
        assert!(marked);
    }

    #[test]
    fn test_t8_near_miss_does_not_mark() {
        let marked = decide("T8", |_| Ok("TG80".to_string())).unwrap();
        assert!(!marked);
    }

    #[test]
    fn test_t8_reads_the_tg83_region() {
        let mut asked = None;
        decide("T8", |rect| {
            asked = Some(*rect);
            Ok(String::new())
        })
        .unwrap();
        assert_eq!(asked, Some(regions::TG83));
    }

    #[test]
    fn test_a3_marks_on_either_part_prefix() {
        assert!(decide("A3", |_| Ok("PN A70L1234".to_string())).unwrap());
        assert!(decide("A3", |_| Ok("A6S6-77".to_string())).unwrap());
        assert!(!decide("A3", |_| Ok("B70L".to_string())).unwrap());
    }

    #[test]
    fn test_z1_shares_the_a3_rectangle() {
        assert_eq!(rule_for("Z1").region(), rule_for("A3").region());
    }

    #[test]
    fn test_z1_matches_its_own_pattern_only() {
        assert!(decide("Z1", |_| Ok("Z0011070".to_string())).unwrap());
        assert!(!decide("Z1", |_| Ok("A70L".to_string())).unwrap());
    }

    #[test]
    fn test_substring_matching_survives_embedded_newlines() {
        assert!(decide("T8", |_| Ok("PACK\nTG83\nEND".to_string())).unwrap());
    }

    #[test]
    fn test_default_branch_requires_exactly_one_line() {
        assert!(decide("OTHER", |_| Ok("PYW5".to_string())).unwrap());
        assert!(decide("OTHER", |_| Ok("  PYW5 \n\n".to_string())).unwrap());
        assert!(!decide("OTHER", |_| Ok("PYW5\nEXTRA".to_string())).unwrap());
    }

    #[test]
    fn test_default_branch_is_exact_equality_not_substring() {
        assert!(!decide("OTHER", |_| Ok("PYW55".to_string())).unwrap());
        assert!(!decide("OTHER", |_| Ok("XPYW5".to_string())).unwrap());
    }

    #[test]
    fn test_default_branch_accepts_each_standalone_code() {
        for code in STANDALONE_CODES {
            assert!(decide("DOCK9", |_| Ok(code.to_string())).unwrap());
        }
    }

    #[test]
    fn test_default_branch_never_reads_dock_specific_regions() {
        let mut asked = None;
        decide("P1", |rect| {
            asked = Some(*rect);
            Ok(String::new())
        })
        .unwrap();
        assert_eq!(asked, Some(regions::OTHER_CODES));
    }

    #[test]
    fn test_empty_extraction_is_no_match_everywhere() {
        for dock in ["T8", "A3", "Z1", "OTHER"] {
            assert!(!decide(dock, |_| Ok(String::new())).unwrap());
        }
    }
}

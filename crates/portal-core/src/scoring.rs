//! Verdict parsing and conviction scoring. The prosecutor's response is
//! free-form text expected to embed a literal `DECISION: <tag>` marker; an
//! absent or unrecognized marker degrades to `Decision::Unknown` rather
//! than an error.

use std::sync::OnceLock;

use contracts::{Decision, ProgressionRecord};
use regex::Regex;

fn decision_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)DECISION:\s*(ACCEPT|REJECT|NEED MORE)").expect("decision pattern compiles")
    })
}

/// Extract the adjudication tag from prosecutor text. Case-insensitive,
/// first match wins.
pub fn parse_decision(text: &str) -> Decision {
    let Some(captures) = decision_pattern().captures(text) else {
        return Decision::Unknown;
    };

    match captures[1].to_ascii_uppercase().as_str() {
        "ACCEPT" => Decision::Accept,
        "REJECT" => Decision::Reject,
        "NEED MORE" => Decision::NeedMore,
        _ => Decision::Unknown,
    }
}

/// Apply a raw verdict to the record. NEED MORE is neutral: it bumps its own
/// counter but stays out of the conviction denominator. Unknown leaves every
/// counter untouched. Aggregates are recomputed unconditionally.
pub fn apply_verdict(record: &mut ProgressionRecord, raw: &str) -> Decision {
    let decision = parse_decision(raw);

    match decision {
        Decision::Accept => record.accepted += 1,
        Decision::Reject => record.rejected += 1,
        Decision::NeedMore => record.need_more += 1,
        Decision::Unknown => {}
    }

    record.recompute();
    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_tag_case_insensitively() {
        assert_eq!(parse_decision("DECISION: ACCEPT"), Decision::Accept);
        assert_eq!(parse_decision("decision: reject"), Decision::Reject);
        assert_eq!(parse_decision("Decision:   Need More"), Decision::NeedMore);
    }

    #[test]
    fn finds_the_tag_inside_a_narrative() {
        let verdict = "The filing is thin but the witness account holds.\n\
                       DECISION: ACCEPT\nProceed to arraignment.";
        assert_eq!(parse_decision(verdict), Decision::Accept);
    }

    #[test]
    fn missing_or_mangled_tag_is_unknown() {
        assert_eq!(parse_decision("The prosecutor shrugs."), Decision::Unknown);
        assert_eq!(parse_decision("DECISION: MAYBE"), Decision::Unknown);
        assert_eq!(parse_decision(""), Decision::Unknown);
    }

    #[test]
    fn accept_and_reject_feed_the_conviction_rate() {
        let mut record = ProgressionRecord::default();

        apply_verdict(&mut record, "DECISION: REJECT");
        apply_verdict(&mut record, "DECISION: ACCEPT");

        assert_eq!(record.accepted, 1);
        assert_eq!(record.rejected, 1);
        assert_eq!(record.total_decisions, 2);
        assert_eq!(record.conviction_rate, 0.5);
    }

    #[test]
    fn need_more_is_neutral() {
        let mut record = ProgressionRecord::default();
        record.accepted = 2;
        record.recompute();
        let rate_before = record.conviction_rate;

        let decision = apply_verdict(&mut record, "DECISION: NEED MORE");

        assert_eq!(decision, Decision::NeedMore);
        assert_eq!(record.need_more, 1);
        assert_eq!(record.total_decisions, 2);
        assert_eq!(record.conviction_rate, rate_before);
    }

    #[test]
    fn unknown_changes_nothing_but_still_recomputes() {
        let mut record = ProgressionRecord::default();

        let decision = apply_verdict(&mut record, "no marker here");

        assert_eq!(decision, Decision::Unknown);
        assert_eq!(record, {
            let mut expected = ProgressionRecord::default();
            expected.recompute();
            expected
        });
    }

    #[test]
    fn conviction_rate_never_divides_by_zero() {
        let mut record = ProgressionRecord::default();
        apply_verdict(&mut record, "DECISION: NEED MORE");
        assert_eq!(record.conviction_rate, 0.0);
    }
}

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use snafu::{ensure, OptionExt, Snafu};

/// Minutes are at least two zero padded digits, seconds are `00..=59` and
/// milliseconds are always three digits.
const LAP_TIME_PATTERN: &str = r"^(\d{2,}):([0-5]\d\.\d{3})$";

/// Largest minute field a lap time or a total may have. Everything up to
/// this bound is exact at millisecond precision and parses back.
pub const MAX_MINUTES: u64 = 99_999;

/// Totals must stay below this many seconds, `100000:00.000`.
pub const MAX_TOTAL_SECONDS: f64 = (MAX_MINUTES + 1) as f64 * 60.0;

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum LapTimeError {
    #[snafu(display("expected {expected} lap times for this track, got {actual}"))]
    CountMismatch { expected: usize, actual: usize },

    #[snafu(display("lap {lap}: `{entry}` is not a MM:SS.mmm lap time"))]
    FormatError { lap: usize, entry: String },

    #[snafu(display("lap {lap}: could not read `{entry}` ({reason})"))]
    ParseError {
        lap: usize,
        entry: String,
        reason: String,
    },
}

/// total time of a submission, kept as seconds for sorting and as the
/// canonical display string for responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapTotals {
    pub seconds: f64,
    pub display: String,
}

pub struct LapTimeHelper {}

impl LapTimeHelper {
    /// # validate a lap submission
    /// checks the amount of laps against the track and every entry against
    /// the `MM:SS.mmm` grammar. The count is checked before any entry.
    ///
    /// ## Arguments
    /// * `entries` - the lap times in the order they were driven
    /// * `expected_count` - the lap count configured on the track
    ///
    /// ## Returns
    /// * `Result<(), LapTimeError>` - the first problem found
    pub fn validate<S: AsRef<str>>(entries: &[S], expected_count: usize) -> Result<(), LapTimeError> {
        ensure!(
            entries.len() == expected_count,
            CountMismatchSnafu {
                expected: expected_count,
                actual: entries.len(),
            }
        );

        for (index, entry) in entries.iter().enumerate() {
            parse_entry(index + 1, entry.as_ref())?;
        }

        Ok(())
    }

    /// # sum lap times
    /// sum all lap times in submission order. nothing is rounded here,
    /// rounding only happens in `format_total`.
    ///
    /// ## Arguments
    /// * `entries` - the lap times to sum
    ///
    /// ## Returns
    /// * `f64` - the total in seconds
    pub fn compute_total<S: AsRef<str>>(entries: &[S]) -> Result<f64, LapTimeError> {
        entries
            .iter()
            .enumerate()
            .try_fold(0.0, |total: f64, (index, entry)| -> Result<f64, LapTimeError> {
                let total = total + parse_entry(index + 1, entry.as_ref())?;

                // the display of a larger total would not parse back
                if (total * 1000.0).round() >= MAX_TOTAL_SECONDS * 1000.0 {
                    return Err(LapTimeError::ParseError {
                        lap: index + 1,
                        entry: entry.as_ref().to_string(),
                        reason: format!("total exceeds {MAX_MINUTES} minutes"),
                    });
                }

                Ok(total)
            })
    }

    /// # render a total as `MM:SS.mmm`
    /// minutes are not capped, so 100 minutes renders as `100:00.000`.
    /// the total is rounded to whole milliseconds before it is split so a
    /// value like 59.9996 becomes `01:00.000`.
    /// negative and non finite totals render as `00:00.000`.
    pub fn format_total(total_seconds: f64) -> String {
        // u128 holds every finite f64 up to ~3.4e35 seconds exactly
        let millis = if total_seconds.is_finite() && total_seconds > 0.0 {
            (total_seconds * 1000.0).round() as u128
        } else {
            0
        };

        let minutes = millis / 60_000;
        let seconds = (millis % 60_000) / 1_000;
        let fraction = millis % 1_000;

        format!("{minutes:02}:{seconds:02}.{fraction:03}")
    }

    /// # parse a single lap time
    ///
    /// ## Arguments
    /// * `entry` - a `MM:SS.mmm` string
    ///
    /// ## Returns
    /// * `f64` - the lap time in seconds
    pub fn parse_lap_time(entry: &str) -> Result<f64, LapTimeError> {
        parse_entry(1, entry)
    }

    /// validate and sum in one go. this is what a submission goes through.
    pub fn aggregate<S: AsRef<str>>(entries: &[S], expected_count: usize) -> Result<LapTotals, LapTimeError> {
        LapTimeHelper::validate(entries, expected_count)?;
        let seconds = LapTimeHelper::compute_total(entries)?;

        Ok(LapTotals {
            display: LapTimeHelper::format_total(seconds),
            seconds,
        })
    }
}

fn lap_time_regex() -> &'static Regex {
    static LAP_TIME: OnceLock<Regex> = OnceLock::new();
    LAP_TIME.get_or_init(|| Regex::new(LAP_TIME_PATTERN).expect("lap time pattern is valid"))
}

fn parse_entry(lap: usize, entry: &str) -> Result<f64, LapTimeError> {
    let captures = lap_time_regex()
        .captures(entry)
        .context(FormatSnafu { lap, entry })?;

    let minutes = captures[1].parse::<u64>().map_err(|error| LapTimeError::ParseError {
        lap,
        entry: entry.to_string(),
        reason: error.to_string(),
    })?;

    if minutes > MAX_MINUTES {
        return Err(LapTimeError::ParseError {
            lap,
            entry: entry.to_string(),
            reason: format!("more than {MAX_MINUTES} minutes"),
        });
    }

    let seconds = captures[2].parse::<f64>().map_err(|error| LapTimeError::ParseError {
        lap,
        entry: entry.to_string(),
        reason: error.to_string(),
    })?;

    Ok(minutes as f64 * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sums_laps_in_seconds() {
        let total = LapTimeHelper::compute_total(&["01:30.000", "01:31.000"]).unwrap();
        assert_eq!(total, 181.0);
    }

    #[test]
    fn formats_totals() {
        assert_eq!(LapTimeHelper::format_total(181.0), "03:01.000");
        assert_eq!(LapTimeHelper::format_total(0.0), "00:00.000");
        assert_eq!(LapTimeHelper::format_total(90.5), "01:30.500");
        assert_eq!(LapTimeHelper::format_total(6000.0), "100:00.000");
    }

    #[test]
    fn format_carries_rounded_milliseconds_into_minutes() {
        assert_eq!(LapTimeHelper::format_total(59.9996), "01:00.000");
    }

    #[test]
    fn format_clamps_negative_and_nan() {
        assert_eq!(LapTimeHelper::format_total(-3.0), "00:00.000");
        assert_eq!(LapTimeHelper::format_total(f64::NAN), "00:00.000");
    }

    #[test]
    fn rejects_bare_minutes_and_seconds() {
        let error = LapTimeHelper::validate(&["1:30", "1:31"], 2).unwrap_err();
        assert!(matches!(error, LapTimeError::FormatError { lap: 1, .. }));
    }

    #[test]
    fn rejects_single_digit_minutes_with_millis() {
        let error = LapTimeHelper::validate(&["01:30.000", "1:29.500"], 2).unwrap_err();
        assert_eq!(
            error,
            LapTimeError::FormatError {
                lap: 2,
                entry: "1:29.500".to_string()
            }
        );
    }

    #[test]
    fn rejects_wrong_lap_count() {
        let error = LapTimeHelper::validate(&["01:30.000"], 2).unwrap_err();
        assert_eq!(error, LapTimeError::CountMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn count_is_checked_before_format() {
        let error = LapTimeHelper::validate(&["garbage"], 3).unwrap_err();
        assert!(matches!(error, LapTimeError::CountMismatch { .. }));
    }

    #[test]
    fn rejects_seconds_out_of_range() {
        let error = LapTimeHelper::validate(&["01:60.000"], 1).unwrap_err();
        assert!(matches!(error, LapTimeError::FormatError { .. }));
    }

    #[test]
    fn rejects_surrounding_whitespace() {
        assert!(LapTimeHelper::validate(&[" 01:30.000"], 1).is_err());
        assert!(LapTimeHelper::validate(&["01:30.000\n"], 1).is_err());
    }

    #[test]
    fn oversized_minutes_are_a_parse_error() {
        let entry = format!("{}:00.000", "9".repeat(30));
        let error = LapTimeHelper::parse_lap_time(&entry).unwrap_err();
        assert!(matches!(error, LapTimeError::ParseError { lap: 1, .. }));
    }

    #[test]
    fn minutes_above_the_bound_are_a_parse_error() {
        let error = LapTimeHelper::aggregate(&["10000000000000000:00.000"], 1).unwrap_err();
        assert!(matches!(error, LapTimeError::ParseError { lap: 1, .. }));

        assert!(LapTimeHelper::parse_lap_time("100000:00.000").is_err());
        let longest = LapTimeHelper::parse_lap_time("99999:59.999").unwrap();
        assert_eq!(LapTimeHelper::format_total(longest), "99999:59.999");
    }

    #[test]
    fn totals_above_the_bound_are_rejected() {
        let error = LapTimeHelper::aggregate(&["99999:00.000", "01:00.000", "00:01.000"], 3).unwrap_err();
        assert_eq!(
            error,
            LapTimeError::ParseError {
                lap: 2,
                entry: "01:00.000".to_string(),
                reason: format!("total exceeds {MAX_MINUTES} minutes"),
            }
        );

        let totals = LapTimeHelper::aggregate(&["99998:00.000", "00:59.999"], 2).unwrap();
        assert_eq!(totals.display, "99998:59.999");
    }

    #[test]
    fn aggregate_returns_both_representations() {
        let totals = LapTimeHelper::aggregate(&["01:30.000", "01:29.500", "01:29.000"], 3).unwrap();
        assert!((totals.seconds - 268.5).abs() < 1e-9);
        assert_eq!(totals.display, "04:28.500");
    }

    #[test]
    fn empty_submission_for_zero_laps() {
        let entries: [&str; 0] = [];
        let totals = LapTimeHelper::aggregate(&entries, 0).unwrap();
        assert_eq!(totals.display, "00:00.000");
    }

    fn lap_time_strategy() -> impl Strategy<Value = String> {
        (0u32..100, 0u32..60, 0u32..1000)
            .prop_map(|(minutes, seconds, millis)| format!("{minutes:02}:{seconds:02}.{millis:03}"))
    }

    proptest! {
        #[test]
        fn valid_submissions_have_non_negative_totals(laps in prop::collection::vec(lap_time_strategy(), 1..20)) {
            prop_assert!(LapTimeHelper::validate(&laps, laps.len()).is_ok());
            let total = LapTimeHelper::compute_total(&laps).unwrap();
            prop_assert!(total >= 0.0);
        }

        #[test]
        fn formatted_totals_parse_back(total in 0.0f64..(MAX_TOTAL_SECONDS - 0.001)) {
            let formatted = LapTimeHelper::format_total(total);
            let parsed = LapTimeHelper::parse_lap_time(&formatted).unwrap();
            prop_assert!((parsed - total).abs() <= 0.0005 + 1e-6, "{} -> {} -> {}", total, formatted, parsed);
        }

        #[test]
        fn totals_past_the_bound_do_not_parse_back(total in MAX_TOTAL_SECONDS..1e18) {
            let formatted = LapTimeHelper::format_total(total);
            let parsed = LapTimeHelper::parse_lap_time(&formatted);
            prop_assert!(matches!(parsed, Err(LapTimeError::ParseError { .. })), "{}", formatted);
        }

        #[test]
        fn stored_display_matches_stored_seconds(laps in prop::collection::vec(lap_time_strategy(), 1..20)) {
            let totals = LapTimeHelper::aggregate(&laps, laps.len()).unwrap();
            let parsed = LapTimeHelper::parse_lap_time(&totals.display).unwrap();
            prop_assert!((parsed - totals.seconds).abs() <= 0.0005 + 1e-6);
        }
    }
}

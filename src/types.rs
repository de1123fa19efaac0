// src/types.rs

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Canonical task id type. For file-system tasks this is the file name,
/// e.g. `"01_create_table.sh"`.
pub type TaskId = String;

/// Kind of a task result as seen by callers after (or during) a run.
///
/// - `NotExecuted`: the task has not been started (initial state).
/// - `Running`: a worker is currently executing the task body.
/// - `Success` / `Failed`: the task's own execution outcome.
/// - `Skipped`: the body was never invoked because a direct dependency did
///   not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResultKind {
    NotExecuted,
    Running,
    Success,
    Failed,
    Skipped,
}

impl ResultKind {
    /// `Success`, `Failed` and `Skipped` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ResultKind::Success | ResultKind::Failed | ResultKind::Skipped
        )
    }
}

impl Default for ResultKind {
    fn default() -> Self {
        ResultKind::NotExecuted
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultKind::NotExecuted => "NOT_EXECUTED",
            ResultKind::Running => "RUNNING",
            ResultKind::Success => "SUCCESS",
            ResultKind::Failed => "FAILED",
            ResultKind::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

impl FromStr for ResultKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "NOT_EXECUTED" => Ok(ResultKind::NotExecuted),
            "RUNNING" => Ok(ResultKind::Running),
            "SUCCESS" => Ok(ResultKind::Success),
            "FAILED" => Ok(ResultKind::Failed),
            "SKIPPED" => Ok(ResultKind::Skipped),
            other => Err(format!("invalid result kind: {other}")),
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ))
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_bad_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("s").is_err());
    }

    #[test]
    fn oversized_durations_are_errors_not_overflows() {
        assert_eq!(
            parse_duration("9999999999999999h"),
            Err("duration too large: '9999999999999999h'".to_string())
        );
        assert!(parse_duration("999999999999999999m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn result_kind_round_trips_through_display() {
        for kind in [
            ResultKind::NotExecuted,
            ResultKind::Running,
            ResultKind::Success,
            ResultKind::Failed,
            ResultKind::Skipped,
        ] {
            assert_eq!(kind.to_string().parse::<ResultKind>(), Ok(kind));
        }
        assert!(ResultKind::Skipped.is_terminal());
        assert!(!ResultKind::Running.is_terminal());
    }
}

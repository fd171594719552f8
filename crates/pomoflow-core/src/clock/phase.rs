use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The three fixed intervals of a Pomodoro session.
///
/// A closed enumeration rather than a string-keyed table: referencing a
/// timer that does not exist is a type error internally and an explicit
/// [`CoreError::UnknownTimer`] at the string boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Work, Phase::ShortBreak, Phase::LongBreak];

    /// The user-facing timer name.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortBreak => "short break",
            Phase::LongBreak => "long break",
        }
    }

    /// Default interval length in minutes.
    pub fn default_minutes(self) -> u64 {
        match self {
            Phase::Work => 25,
            Phase::ShortBreak => 5,
            Phase::LongBreak => 15,
        }
    }

    pub fn is_work(self) -> bool {
        self == Phase::Work
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = CoreError;

    /// Parses the user-facing timer names. Hyphenated spellings are
    /// accepted for shell friendliness.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Phase::Work),
            "short break" | "short-break" => Ok(Phase::ShortBreak),
            "long break" | "long-break" => Ok(Phase::LongBreak),
            other => Err(CoreError::UnknownTimer(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_timer_names() {
        assert_eq!("work".parse::<Phase>().unwrap(), Phase::Work);
        assert_eq!("short break".parse::<Phase>().unwrap(), Phase::ShortBreak);
        assert_eq!("long break".parse::<Phase>().unwrap(), Phase::LongBreak);
        assert_eq!("long-break".parse::<Phase>().unwrap(), Phase::LongBreak);
    }

    #[test]
    fn unknown_name_is_rejected_with_named_error() {
        let err = "lunch break".parse::<Phase>().unwrap_err();
        match err {
            CoreError::UnknownTimer(name) => assert_eq!(name, "lunch break"),
            other => panic!("expected UnknownTimer, got {other:?}"),
        }
    }

    #[test]
    fn display_roundtrips_through_from_str() {
        for phase in Phase::ALL {
            assert_eq!(phase.to_string().parse::<Phase>().unwrap(), phase);
        }
    }

    #[test]
    fn default_durations() {
        assert_eq!(Phase::Work.default_minutes(), 25);
        assert_eq!(Phase::ShortBreak.default_minutes(), 5);
        assert_eq!(Phase::LongBreak.default_minutes(), 15);
    }
}

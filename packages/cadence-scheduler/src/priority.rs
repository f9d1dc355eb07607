use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The three classes of work the scheduler knows about, from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum PriorityLevel {
    /// Drained to completion before control returns to the host.
    Immediate,
    /// Runs inside the remaining budget of the current frame.
    FrameBound,
    /// Runs only when the host reports spare time.
    Idle,
}

impl PriorityLevel {
    pub const ALL: [PriorityLevel; 3] = [
        PriorityLevel::Immediate,
        PriorityLevel::FrameBound,
        PriorityLevel::Idle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityLevel::Immediate => "immediate",
            PriorityLevel::FrameBound => "frame-bound",
            PriorityLevel::Idle => "idle",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown priority level `{0}`")]
pub struct ParsePriorityError(pub String);

impl FromStr for PriorityLevel {
    type Err = ParsePriorityError;

    // Accepts the legacy critical/high/low names alongside the current ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" | "critical" => Ok(PriorityLevel::Immediate),
            "frame-bound" | "frame_bound" | "frame" | "high" => Ok(PriorityLevel::FrameBound),
            "idle" | "low" => Ok(PriorityLevel::Idle),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_current_and_legacy_names() {
        assert_eq!("immediate".parse(), Ok(PriorityLevel::Immediate));
        assert_eq!("CRITICAL".parse(), Ok(PriorityLevel::Immediate));
        assert_eq!("frame-bound".parse(), Ok(PriorityLevel::FrameBound));
        assert_eq!("high".parse(), Ok(PriorityLevel::FrameBound));
        assert_eq!(" low ".parse(), Ok(PriorityLevel::Idle));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "urgent".parse::<PriorityLevel>().unwrap_err();
        assert_eq!(err.to_string(), "unknown priority level `urgent`");
    }

    #[test]
    fn display_round_trips() {
        for level in PriorityLevel::ALL {
            assert_eq!(level.to_string().parse(), Ok(level));
        }
    }
}

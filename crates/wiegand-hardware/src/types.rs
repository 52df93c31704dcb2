//! Common types shared across input line implementations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logic level of an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_low(self) -> bool {
        self == Self::Low
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Idle bias applied to an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bias {
    PullUp,
    PullDown,
    Floating,
}

impl Bias {
    /// Level the line rests at with nothing driving it.
    pub fn idle_level(self) -> Level {
        match self {
            Self::PullUp | Self::Floating => Level::High,
            Self::PullDown => Level::Low,
        }
    }
}

/// Which transitions an input line reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Falling,
    Rising,
    Both,
}

impl Edge {
    /// Check whether a transition that ended at `level` is reported.
    pub fn matches(self, level: Level) -> bool {
        match self {
            Self::Falling => level == Level::Low,
            Self::Rising => level == Level::High,
            Self::Both => true,
        }
    }
}

/// Enumerated line metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInfo {
    /// Line name (e.g. "GPIO4").
    pub name: String,

    /// Current pin function if the backend knows it (e.g. "IN", "ALT0", "I2C1_SDA").
    pub function: Option<String>,
}

impl LineInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            function: None,
        }
    }

    /// Set the pin function.
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Pin function, or "unknown".
    pub fn function_name(&self) -> &str {
        self.function.as_deref().unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_matches() {
        assert!(Edge::Falling.matches(Level::Low));
        assert!(!Edge::Falling.matches(Level::High));
        assert!(Edge::Rising.matches(Level::High));
        assert!(Edge::Both.matches(Level::Low));
        assert!(Edge::Both.matches(Level::High));
    }

    #[test]
    fn test_bias_idle_level() {
        assert_eq!(Bias::PullUp.idle_level(), Level::High);
        assert_eq!(Bias::PullDown.idle_level(), Level::Low);
    }

    #[test]
    fn test_line_info() {
        let info = LineInfo::new("GPIO2").with_function("I2C1_SDA");
        assert_eq!(info.function_name(), "I2C1_SDA");
        assert_eq!(LineInfo::new("GPIO4").function_name(), "unknown");
    }

    #[test]
    fn test_level_serialization() {
        let json = serde_json::to_string(&Level::Low).unwrap();
        let level: Level = serde_json::from_str(&json).unwrap();
        assert_eq!(level, Level::Low);
        assert_eq!(Level::High.to_string(), "High");
    }
}

//! Core domain types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Training focus; selects the schedule prompt and the training view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingType {
    #[default]
    Strength,
    Cardio,
    Flexibility,
}

impl TrainingType {
    pub const ALL: [TrainingType; 3] = [TrainingType::Strength, TrainingType::Cardio, TrainingType::Flexibility];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingType::Strength => "strength",
            TrainingType::Cardio => "cardio",
            TrainingType::Flexibility => "flexibility",
        }
    }

    /// Capitalized name, e.g. "Cardio"
    pub fn title(&self) -> &'static str {
        match self {
            TrainingType::Strength => "Strength",
            TrainingType::Cardio => "Cardio",
            TrainingType::Flexibility => "Flexibility",
        }
    }

    /// Name of the workout row created when this becomes the goal
    pub fn workout_name(&self) -> String {
        format!("{} Training", self.title())
    }

    /// Short description shown above the schedule
    pub fn description(&self) -> &'static str {
        match self {
            TrainingType::Strength => {
                "Build muscle and power with progressive resistance work. Each session pairs compound lifts \
                 with accessory movements; rest well between sets and keep form strict."
            }
            TrainingType::Cardio => {
                "Improve endurance and heart health with a mix of steady-state and interval sessions. \
                 Warm up first and build intensity gradually through the week."
            }
            TrainingType::Flexibility => {
                "Increase range of motion and ease muscle tension with mobility drills and stretching. \
                 Move slowly, breathe steadily and never force a stretch."
            }
        }
    }
}

impl fmt::Display for TrainingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strength" => Ok(TrainingType::Strength),
            "cardio" => Ok(TrainingType::Cardio),
            "flexibility" => Ok(TrainingType::Flexibility),
            other => Err(format!(
                "unknown training type '{}' (expected strength, cardio or flexibility)",
                other
            )),
        }
    }
}

/// Self-reported fitness level used in workout plan prompts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitnessLevel::Beginner => "beginner",
            FitnessLevel::Intermediate => "intermediate",
            FitnessLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitnessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(FitnessLevel::Beginner),
            "intermediate" => Ok(FitnessLevel::Intermediate),
            "advanced" => Ok(FitnessLevel::Advanced),
            other => Err(format!(
                "unknown fitness level '{}' (expected beginner, intermediate or advanced)",
                other
            )),
        }
    }
}

/// One day of a formatted schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Positional label, `Day {index}`
    pub label: String,
    pub content: String,
    pub expanded: bool,
}

/// One turn in the chat transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            timestamp: Local::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
            timestamp: Local::now(),
        }
    }

    /// `User: {text}` or `Assistant: {text}`
    pub fn history_line(&self) -> String {
        let speaker = if self.is_user { "User" } else { "Assistant" };
        format!("{}: {}", speaker, self.text)
    }

    /// Wall-clock time as `HH:MM:SS`
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// The user's current workout plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub name: String,
    pub duration: String,
    pub intensity: String,
    pub exercises: Vec<String>,
}

impl WorkoutPlan {
    pub const DEFAULT_DURATION: &'static str = "45 minutes";
    pub const DEFAULT_INTENSITY: &'static str = "Moderate";

    pub fn new(name: impl Into<String>, exercises: Vec<String>) -> Self {
        Self {
            name: name.into(),
            duration: Self::DEFAULT_DURATION.to_string(),
            intensity: Self::DEFAULT_INTENSITY.to_string(),
            exercises,
        }
    }
}

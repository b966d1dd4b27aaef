//! The configuration document and its hardcoded defaults.
//!
//! Each category fills missing fields from its defaults while deserializing and
//! rejects fields it does not know. Deserializing a partial override therefore
//! performs the field-by-field merge onto defaults, and a stray key is caught as
//! a shape error instead of being silently kept.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level settings categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    User,
    Communication,
    Emotional,
    Food,
    Schedule,
    System,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::User,
        Category::Communication,
        Category::Emotional,
        Category::Food,
        Category::Schedule,
        Category::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::User => "user",
            Category::Communication => "communication",
            Category::Emotional => "emotional",
            Category::Food => "food",
            Category::Schedule => "schedule",
            Category::System => "system",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// The full nested settings document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigDocument {
    pub user: UserConfig,
    pub communication: CommunicationConfig,
    pub emotional: EmotionalConfig,
    pub food: FoodConfig,
    pub schedule: ScheduleConfig,
    pub system: SystemConfig,
}

/// Profile of the child using the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct UserConfig {
    pub name: String,
    pub age: u32,
    pub avatar: String,
    pub language: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: "Damián".to_string(),
            age: 6,
            avatar: "default".to_string(),
            language: "es".to_string(),
        }
    }
}

/// One pictogram button on the communication board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Phrase {
    pub id: String,
    pub text: String,
    #[serde(default = "default_phrase_category")]
    pub category: String,
    #[serde(default)]
    pub icon: Option<String>,
}

fn default_phrase_category() -> String {
    "basic".to_string()
}

impl Phrase {
    fn new(id: &str, text: &str, category: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            category: category.to_string(),
            icon: Some(icon.to_string()),
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct VoiceConfig {
    pub enabled: bool,
    pub rate: f64,
    pub pitch: f64,
    pub language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 0.8,
            pitch: 1.0,
            language: "es-ES".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct CommunicationConfig {
    pub phrases: Vec<Phrase>,
    pub voice: VoiceConfig,
    pub grid_columns: u32,
    pub show_text: bool,
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        Self {
            phrases: vec![
                Phrase::new("want", "Quiero", "needs", "hand"),
                Phrase::new("help", "Ayuda", "needs", "help"),
                Phrase::new("bathroom", "Baño", "needs", "toilet"),
                Phrase::new("water", "Agua", "food", "glass"),
                Phrase::new("no", "No", "basic", "cross"),
                Phrase::new("yes", "Sí", "basic", "check"),
            ],
            voice: VoiceConfig::default(),
            grid_columns: 3,
            show_text: true,
        }
    }
}

/// Durations in seconds used by the emotional regulation tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Timeouts {
    pub wait_time: u32,
    pub breathing_time: u32,
    pub calm_down_time: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            wait_time: 30,
            breathing_time: 60,
            calm_down_time: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct EmotionalConfig {
    pub timeouts: Timeouts,
    pub strategies: Vec<String>,
    pub sounds_enabled: bool,
    pub vibration_enabled: bool,
}

impl Default for EmotionalConfig {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            strategies: ["breathing", "counting", "music", "hug"]
                .into_iter()
                .map(String::from)
                .collect(),
            sounds_enabled: true,
            vibration_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct DailyGoals {
    pub stars: u32,
    pub new_foods: u32,
    pub completed_meals: u32,
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self {
            stars: 5,
            new_foods: 1,
            completed_meals: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Rewards {
    pub enabled: bool,
    pub stars_per_meal: u32,
    pub stars_per_new_food: u32,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            enabled: true,
            stars_per_meal: 1,
            stars_per_new_food: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct FoodConfig {
    pub daily_goals: DailyGoals,
    pub rewards: Rewards,
    pub favorite_foods: Vec<String>,
    pub avoided_foods: Vec<String>,
}

/// One entry of the visual daily schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub title: String,
    /// Local time of day, `HH:MM`.
    pub time: String,
    #[serde(default)]
    pub icon: Option<String>,
}

impl Routine {
    fn new(id: &str, title: &str, time: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            time: time.to_string(),
            icon: Some(icon.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub routines: Vec<Routine>,
    pub reminders_enabled: bool,
    pub reminder_minutes_before: u32,
    pub visual_timer_enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            routines: vec![
                Routine::new("wake", "Despertar", "07:30", "sun"),
                Routine::new("lunch", "Almuerzo", "13:00", "plate"),
                Routine::new("bath", "Baño", "19:00", "bathtub"),
                Routine::new("sleep", "Dormir", "20:30", "moon"),
            ],
            reminders_enabled: true,
            reminder_minutes_before: 5,
            visual_timer_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct SystemConfig {
    pub version: String,
    pub theme: String,
    pub sound_volume: f64,
    pub haptic_feedback: bool,
    /// PIN guarding the family/therapist panel. `None` leaves it open.
    pub admin_pin: Option<String>,
    pub last_backup: Option<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            theme: "light".to_string(),
            sound_volume: 0.7,
            haptic_feedback: true,
            admin_pin: None,
            last_backup: None,
        }
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of calendar entry, carrying the scheduling flags the conflict rules consult.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventType {
    pub id: Uuid,
    pub name: String,
    /// Label used when numbering generated entries ("Lesson 3").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_label: Option<String>,
    /// Entries of this type occupy every room (e.g. holidays).
    #[serde(default)]
    pub all_rooms: bool,
    /// Entries of this type only conflict with other user-locking entries of the same user.
    #[serde(default)]
    pub locks_user: bool,
    /// Entries of this type never block anything.
    #[serde(default)]
    pub transparent: bool,
    /// Number of simultaneous entries tolerated before a conflict is reported.
    #[serde(default = "EventType::default_max_conflicting")]
    pub max_conflicting: u32,
    /// Longest allowed span of a single entry, in days.
    #[serde(default = "EventType::default_max_days")]
    pub max_days: u32,
}

impl EventType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            event_label: None,
            all_rooms: false,
            locks_user: false,
            transparent: false,
            max_conflicting: Self::default_max_conflicting(),
            max_days: Self::default_max_days(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.event_label = Some(label.into());
        self
    }

    pub fn locking_all_rooms(mut self) -> Self {
        self.all_rooms = true;
        self
    }

    pub fn locking_user(mut self) -> Self {
        self.locks_user = true;
        self
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn with_max_days(mut self, days: u32) -> Self {
        self.max_days = days;
        self
    }

    pub fn with_max_conflicting(mut self, count: u32) -> Self {
        self.max_conflicting = count;
        self
    }

    /// The entry label, falling back to the type name.
    pub fn label(&self) -> &str {
        self.event_label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or(&self.name)
    }

    fn default_max_conflicting() -> u32 {
        1
    }

    fn default_max_days() -> u32 {
        1
    }
}

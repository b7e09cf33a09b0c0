use std::fmt;

use serde::{
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;

/// Wire shape of one roster entry; the activity name is the enclosing map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDetails {
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    #[serde(default, deserialize_with = "participants_or_empty")]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    pub participants: Vec<String>,
}

impl Activity {
    pub fn from_details(name: impl Into<String>, details: ActivityDetails) -> Self {
        Self {
            name: name.into(),
            description: details.description,
            schedule: details.schedule,
            max_participants: details.max_participants,
            participants: details.participants,
        }
    }

    /// Remaining capacity. Negative when the server has over-enrolled.
    pub fn spots_left(&self) -> i64 {
        i64::from(self.max_participants) - self.participants.len() as i64
    }

    fn details(&self) -> ActivityDetails {
        ActivityDetails {
            description: self.description.clone(),
            schedule: self.schedule.clone(),
            max_participants: self.max_participants,
            participants: self.participants.clone(),
        }
    }
}

/// Activities keyed by name, in the order the server listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    activities: Vec<Activity>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an activity, replacing an existing entry with the same name in place.
    pub fn insert(&mut self, activity: Activity) {
        match self.activities.iter_mut().find(|a| a.name == activity.name) {
            Some(existing) => *existing = activity,
            None => self.activities.push(activity),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Activity> {
        self.activities.iter_mut().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.activities.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

impl FromIterator<Activity> for Roster {
    fn from_iter<I: IntoIterator<Item = Activity>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for activity in iter {
            roster.insert(activity);
        }
        roster
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Activity;
    type IntoIter = std::slice::Iter<'a, Activity>;

    fn into_iter(self) -> Self::IntoIter {
        self.activities.iter()
    }
}

impl Serialize for Roster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.activities.len()))?;
        for activity in &self.activities {
            map.serialize_entry(&activity.name, &activity.details())?;
        }
        map.end()
    }
}

struct RosterVisitor;

impl<'de> Visitor<'de> for RosterVisitor {
    type Value = Roster;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of activity name to activity details")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Roster, M::Error> {
        let mut roster = Roster {
            activities: Vec::with_capacity(access.size_hint().unwrap_or(0)),
        };
        while let Some((name, details)) = access.next_entry::<String, ActivityDetails>()? {
            roster.insert(Activity::from_details(name, details));
        }
        Ok(roster)
    }
}

impl<'de> Deserialize<'de> for Roster {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RosterVisitor)
    }
}

// A missing or non-array value is an empty list; a non-string entry is malformed.
fn participants_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(email) => Ok(email),
                other => Err(de::Error::custom(format!(
                    "participant entry must be a string, got {other}"
                ))),
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_keeps_server_key_order() {
        let raw = r#"{
            "Zumba": {"description": "z", "schedule": "Mon", "max_participants": 3, "participants": []},
            "Art Club": {"description": "a", "schedule": "Tue", "max_participants": 2, "participants": ["a@x.edu"]},
            "Chess Club": {"description": "c", "schedule": "Wed", "max_participants": 1, "participants": []}
        }"#;
        let roster: Roster = serde_json::from_str(raw).expect("roster");
        assert_eq!(
            roster.names().collect::<Vec<_>>(),
            vec!["Zumba", "Art Club", "Chess Club"]
        );
    }

    #[test]
    fn participants_default_to_empty_when_missing_or_not_a_list() {
        let raw = r#"{
            "Chess Club": {"description": "c", "schedule": "Fri", "max_participants": 12},
            "Drama": {"description": "d", "schedule": "Sat", "max_participants": 4, "participants": "nobody"}
        }"#;
        let roster: Roster = serde_json::from_str(raw).expect("roster");
        assert!(roster.iter().all(|a| a.participants.is_empty()));
    }

    #[test]
    fn non_string_participant_is_malformed() {
        let raw = r#"{"Chess Club": {"description": "c", "schedule": "Fri", "max_participants": 12, "participants": [42]}}"#;
        assert!(serde_json::from_str::<Roster>(raw).is_err());
    }

    #[test]
    fn negative_capacity_is_malformed() {
        let raw = r#"{"Chess Club": {"description": "c", "schedule": "Fri", "max_participants": -1}}"#;
        assert!(serde_json::from_str::<Roster>(raw).is_err());
    }

    #[test]
    fn spots_left_goes_negative_when_over_enrolled() {
        let activity = Activity {
            name: "Chess Club".into(),
            description: String::new(),
            schedule: String::new(),
            max_participants: 1,
            participants: vec!["a@x.edu".into(), "b@x.edu".into(), "c@x.edu".into()],
        };
        assert_eq!(activity.spots_left(), -2);
    }

    #[test]
    fn serialized_roster_round_trips_in_order() {
        let roster: Roster = ["B", "A"]
            .into_iter()
            .map(|name| Activity {
                name: name.into(),
                description: "d".into(),
                schedule: "s".into(),
                max_participants: 5,
                participants: vec![],
            })
            .collect();
        let raw = serde_json::to_string(&roster).expect("serialize");
        assert!(raw.find("\"B\"") < raw.find("\"A\""));
        let back: Roster = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back, roster);
    }
}

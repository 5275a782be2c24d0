//! Explicit-presence field updates.
//!
//! A partial update has to tell apart three cases that `Option<T>` folds
//! into two: the field was not sent, the field was sent as `null`, and the
//! field was sent with a value. [`Patch`] keeps all three.
//!
//! In JSON, fields annotated with `#[serde(default)]` map as follows:
//!
//! | payload            | `Patch`          |
//! |--------------------|------------------|
//! | key absent         | `Patch::Keep`    |
//! | `"key": null`      | `Patch::Clear`   |
//! | `"key": <value>`   | `Patch::Set(v)`  |

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One field of a partial update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Carry the previous value forward.
    #[default]
    Keep,
    /// Remove the value.
    Clear,
    /// Replace the value.
    Set(T),
}

impl<T> Patch<T> {
    /// Returns `true` when the field was not provided.
    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Returns `true` when the field was provided, as a value or as `null`.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        !self.is_keep()
    }
}

impl<T: Clone> Patch<T> {
    /// Resolve against the previous value of an optional field.
    #[must_use]
    pub fn carry(&self, previous: Option<&T>) -> Option<T> {
        match self {
            Self::Keep => previous.cloned(),
            Self::Clear => None,
            Self::Set(value) => Some(value.clone()),
        }
    }
}

impl Patch<String> {
    /// Resolve against the previous value of a required text field.
    ///
    /// `Clear` resolves to the empty string so that snapshot validation
    /// rejects it instead of silently keeping the old value.
    #[must_use]
    pub fn carry_required(&self, previous: &str) -> String {
        match self {
            Self::Keep => previous.to_owned(),
            Self::Clear => String::new(),
            Self::Set(value) => value.clone(),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(value) => serializer.serialize_some(value),
            Self::Keep | Self::Clear => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Patch;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Deserialize, Serialize)]
    struct Probe {
        #[serde(default, skip_serializing_if = "Patch::is_keep")]
        notes: Patch<String>,
        #[serde(default, skip_serializing_if = "Patch::is_keep")]
        minutes: Patch<i64>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Probe = serde_json::from_str("{}").expect("parse absent");
        assert_eq!(absent.notes, Patch::Keep);

        let cleared: Probe = serde_json::from_str(r#"{"notes": null}"#).expect("parse null");
        assert_eq!(cleared.notes, Patch::Clear);

        let set: Probe = serde_json::from_str(r#"{"notes": ""}"#).expect("parse empty");
        assert_eq!(set.notes, Patch::Set(String::new()));
    }

    #[test]
    fn carry_resolves_against_previous() {
        let previous = Some(30_i64);
        assert_eq!(Patch::Keep.carry(previous.as_ref()), Some(30));
        assert_eq!(Patch::<i64>::Clear.carry(previous.as_ref()), None);
        assert_eq!(Patch::Set(45).carry(previous.as_ref()), Some(45));
        assert_eq!(Patch::Set(45).carry(None), Some(45));
    }

    #[test]
    fn carry_required_turns_clear_into_empty() {
        assert_eq!(Patch::Keep.carry_required("pending"), "pending");
        assert_eq!(Patch::Clear.carry_required("pending"), "");
        assert_eq!(
            Patch::Set("done".to_string()).carry_required("pending"),
            "done"
        );
    }

    #[test]
    fn keep_is_omitted_when_serialized() {
        let probe = Probe {
            notes: Patch::Clear,
            minutes: Patch::Keep,
        };
        let json = serde_json::to_string(&probe).expect("serialize probe");
        assert_eq!(json, r#"{"notes":null}"#);
    }
}

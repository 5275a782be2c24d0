//! Request snapshot, partial update, and versioned record types.
//!
//! Field names follow the public JSON contract (`snake_case`, unset
//! optionals serialized as `null`).

use super::patch::Patch;
use crate::error::FieldViolation;
use crate::ledger::merge::{Snapshot, require_text};
use crate::ledger::record::{VersionedRecord, truncate_to_micros};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full state of a hotel service request at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeRequest {
    pub hotel_id: String,
    #[serde(default)]
    pub guest_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub reservation_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub request_category: Option<String>,
    pub request_type: String,
    #[serde(default)]
    pub department: Option<String>,
    pub status: String,
    pub priority: String,
    /// Minutes.
    #[serde(default)]
    pub estimated_completion_time: Option<i32>,
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MakeRequest {
    /// A request with every required field set and every optional one unset.
    #[must_use]
    pub fn new(
        hotel_id: impl Into<String>,
        name: impl Into<String>,
        request_type: impl Into<String>,
        status: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            hotel_id: hotel_id.into(),
            guest_id: None,
            user_id: None,
            reservation_id: None,
            name: name.into(),
            description: None,
            room_id: None,
            request_category: None,
            request_type: request_type.into(),
            department: None,
            status: status.into(),
            priority: priority.into(),
            estimated_completion_time: None,
            scheduled_time: None,
            completed_at: None,
            notes: None,
        }
    }
}

/// Partial update of a request: absent fields are kept, `null` clears,
/// a value replaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateRequest {
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub hotel_id: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub guest_id: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub user_id: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub reservation_id: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub name: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub room_id: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub request_category: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub request_type: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub department: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub status: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub priority: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub estimated_completion_time: Patch<i32>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub scheduled_time: Patch<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub completed_at: Patch<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub notes: Patch<String>,
}

/// Names accepted by [`UpdateRequest::clear`].
pub const UPDATE_FIELDS: &[&str] = &[
    "hotel_id",
    "guest_id",
    "user_id",
    "reservation_id",
    "name",
    "description",
    "room_id",
    "request_category",
    "request_type",
    "department",
    "status",
    "priority",
    "estimated_completion_time",
    "scheduled_time",
    "completed_at",
    "notes",
];

impl UpdateRequest {
    /// Returns `true` when no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.hotel_id.is_keep()
            && self.guest_id.is_keep()
            && self.user_id.is_keep()
            && self.reservation_id.is_keep()
            && self.name.is_keep()
            && self.description.is_keep()
            && self.room_id.is_keep()
            && self.request_category.is_keep()
            && self.request_type.is_keep()
            && self.department.is_keep()
            && self.status.is_keep()
            && self.priority.is_keep()
            && self.estimated_completion_time.is_keep()
            && self.scheduled_time.is_keep()
            && self.completed_at.is_keep()
            && self.notes.is_keep()
    }

    /// Mark `field` as explicitly cleared. Returns `false` for an unknown
    /// field name.
    pub fn clear(&mut self, field: &str) -> bool {
        match field {
            "hotel_id" => self.hotel_id = Patch::Clear,
            "guest_id" => self.guest_id = Patch::Clear,
            "user_id" => self.user_id = Patch::Clear,
            "reservation_id" => self.reservation_id = Patch::Clear,
            "name" => self.name = Patch::Clear,
            "description" => self.description = Patch::Clear,
            "room_id" => self.room_id = Patch::Clear,
            "request_category" => self.request_category = Patch::Clear,
            "request_type" => self.request_type = Patch::Clear,
            "department" => self.department = Patch::Clear,
            "status" => self.status = Patch::Clear,
            "priority" => self.priority = Patch::Clear,
            "estimated_completion_time" => self.estimated_completion_time = Patch::Clear,
            "scheduled_time" => self.scheduled_time = Patch::Clear,
            "completed_at" => self.completed_at = Patch::Clear,
            "notes" => self.notes = Patch::Clear,
            _ => return false,
        }
        true
    }
}

impl Snapshot for MakeRequest {
    type Update = UpdateRequest;

    fn apply(&self, update: &UpdateRequest) -> Self {
        Self {
            hotel_id: update.hotel_id.carry_required(&self.hotel_id),
            guest_id: update.guest_id.carry(self.guest_id.as_ref()),
            user_id: update.user_id.carry(self.user_id.as_ref()),
            reservation_id: update.reservation_id.carry(self.reservation_id.as_ref()),
            name: update.name.carry_required(&self.name),
            description: update.description.carry(self.description.as_ref()),
            room_id: update.room_id.carry(self.room_id.as_ref()),
            request_category: update
                .request_category
                .carry(self.request_category.as_ref()),
            request_type: update.request_type.carry_required(&self.request_type),
            department: update.department.carry(self.department.as_ref()),
            status: update.status.carry_required(&self.status),
            priority: update.priority.carry_required(&self.priority),
            estimated_completion_time: update
                .estimated_completion_time
                .carry(self.estimated_completion_time.as_ref()),
            scheduled_time: update.scheduled_time.carry(self.scheduled_time.as_ref()),
            completed_at: update.completed_at.carry(self.completed_at.as_ref()),
            notes: update.notes.carry(self.notes.as_ref()),
        }
    }

    fn violations(&self) -> Vec<FieldViolation> {
        [
            require_text("hotel_id", &self.hotel_id),
            require_text("name", &self.name),
            require_text("request_type", &self.request_type),
            require_text("status", &self.status),
            require_text("priority", &self.priority),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn normalized(self) -> Self {
        Self {
            scheduled_time: self.scheduled_time.map(truncate_to_micros),
            completed_at: self.completed_at.map(truncate_to_micros),
            ..self
        }
    }
}

/// A request as stored and returned: the snapshot flattened with `id`,
/// `version`, `created_at`, and `updated_at`.
pub type Request = VersionedRecord<MakeRequest>;

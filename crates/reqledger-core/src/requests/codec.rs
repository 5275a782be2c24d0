use crate::db::codec::{
    RowCodec, opt_int_value, opt_micros_from_row, opt_micros_value, opt_text_value, text_value,
};
use crate::model::MakeRequest;
use rusqlite::Row;
use rusqlite::types::Value;

impl RowCodec for MakeRequest {
    const TABLE: &'static str = "request_versions";

    const COLUMNS: &'static [&'static str] = &[
        "hotel_id",
        "guest_id",
        "user_id",
        "reservation_id",
        "room_id",
        "name",
        "description",
        "request_category",
        "request_type",
        "department",
        "status",
        "priority",
        "estimated_completion_time",
        "scheduled_time_us",
        "completed_at_us",
        "notes",
    ];

    const FILTER_COLUMNS: &'static [&'static str] = &["status", "hotel_id"];

    fn to_values(&self) -> Vec<Value> {
        vec![
            text_value(&self.hotel_id),
            opt_text_value(self.guest_id.as_deref()),
            opt_text_value(self.user_id.as_deref()),
            opt_text_value(self.reservation_id.as_deref()),
            opt_text_value(self.room_id.as_deref()),
            text_value(&self.name),
            opt_text_value(self.description.as_deref()),
            opt_text_value(self.request_category.as_deref()),
            text_value(&self.request_type),
            opt_text_value(self.department.as_deref()),
            text_value(&self.status),
            text_value(&self.priority),
            opt_int_value(self.estimated_completion_time.map(i64::from)),
            opt_micros_value(self.scheduled_time),
            opt_micros_value(self.completed_at),
            opt_text_value(self.notes.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            hotel_id: row.get(offset)?,
            guest_id: row.get(offset + 1)?,
            user_id: row.get(offset + 2)?,
            reservation_id: row.get(offset + 3)?,
            room_id: row.get(offset + 4)?,
            name: row.get(offset + 5)?,
            description: row.get(offset + 6)?,
            request_category: row.get(offset + 7)?,
            request_type: row.get(offset + 8)?,
            department: row.get(offset + 9)?,
            status: row.get(offset + 10)?,
            priority: row.get(offset + 11)?,
            estimated_completion_time: row.get(offset + 12)?,
            scheduled_time: opt_micros_from_row(row, offset + 13)?,
            completed_at: opt_micros_from_row(row, offset + 14)?,
            notes: row.get(offset + 15)?,
        })
    }
}

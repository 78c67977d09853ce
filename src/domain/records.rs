// src/domain/records.rs

//! Child rows shared by both pipelines. They serialize their parent key as
//! `leadId` or `collegeId` depending on the pipeline they were loaded for.

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::domain::enums::{ActivityAction, WorkStatus};

#[derive(Debug, Clone)]
pub struct Note {
    pub id: i64,
    pub parent_key: &'static str,
    pub parent_id: i64,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Serialize for Note {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Note", 6)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field(self.parent_key, &self.parent_id)?;
        s.serialize_field("authorId", &self.author_id)?;
        s.serialize_field("authorName", &self.author_name)?;
        s.serialize_field("content", &self.content)?;
        s.serialize_field("createdAt", &self.created_at)?;
        s.end()
    }
}

/// A follow-up task attached to a lead or college.
#[derive(Debug, Clone)]
pub struct Work {
    pub id: i64,
    pub parent_key: &'static str,
    pub parent_id: i64,
    pub parent_name: Option<String>,
    pub assigned_to_id: Option<i64>,
    pub title: String,
    pub status: WorkStatus,
    pub due_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Serialize for Work {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Work", 10)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field(self.parent_key, &self.parent_id)?;
        s.serialize_field("parentName", &self.parent_name)?;
        s.serialize_field("assignedToId", &self.assigned_to_id)?;
        s.serialize_field("title", &self.title)?;
        s.serialize_field("status", &self.status)?;
        s.serialize_field("dueDate", &self.due_date)?;
        s.serialize_field("completedAt", &self.completed_at)?;
        s.serialize_field("createdAt", &self.created_at)?;
        s.serialize_field("updatedAt", &self.updated_at)?;
        s.end()
    }
}

#[derive(Debug, Clone)]
pub struct ActivityLog {
    pub id: i64,
    pub parent_key: &'static str,
    pub parent_id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub action: ActivityAction,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Serialize for ActivityLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ActivityLog", 9)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field(self.parent_key, &self.parent_id)?;
        s.serialize_field("userId", &self.user_id)?;
        s.serialize_field("userName", &self.user_name)?;
        s.serialize_field("action", &self.action)?;
        s.serialize_field("field", &self.field)?;
        s.serialize_field("oldValue", &self.old_value)?;
        s.serialize_field("newValue", &self.new_value)?;
        s.serialize_field("createdAt", &self.created_at)?;
        s.end()
    }
}

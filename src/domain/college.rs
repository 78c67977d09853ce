// src/domain/college.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::dates::deserialize_opt_datetime;
use crate::domain::enums::{CollegeFollowUpStatus, CollegeStatus};
use crate::domain::pipeline::{CollegePipeline, TrackingChange};
use crate::domain::records::{ActivityLog, Note, Work};
use crate::domain::{differs, optional_differs, require_text, text_differs};
use crate::errors::ServerError;

/// A college approached for outreach.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct College {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub courses: Option<String>,
    pub student_strength: Option<i64>,
    pub status: CollegeStatus,
    pub follow_up_status: CollegeFollowUpStatus,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<i64>,
    pub assigned_to_name: Option<String>,
    pub created_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CollegeDetail {
    #[serde(flatten)]
    pub college: College,
    pub notes: Vec<Note>,
    pub works: Vec<Work>,
    pub activity: Vec<ActivityLog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollege {
    pub name: String,
    pub city: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub courses: Option<String>,
    pub student_strength: Option<i64>,
    pub status: Option<CollegeStatus>,
    pub follow_up_status: Option<CollegeFollowUpStatus>,
    #[serde(default, deserialize_with = "deserialize_opt_datetime")]
    pub follow_up_date: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<i64>,
}

impl NewCollege {
    pub fn validate(&self) -> Result<DateTime<Utc>, ServerError> {
        require_text("name", &self.name)?;
        if matches!(self.student_strength, Some(n) if n < 0) {
            return Err(ServerError::BadRequest("studentStrength must not be negative".into()));
        }
        self.follow_up_date
            .ok_or_else(|| ServerError::BadRequest("followUpDate is required".into()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollegeUpdate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub courses: Option<String>,
    pub student_strength: Option<i64>,
    pub status: Option<CollegeStatus>,
    pub follow_up_status: Option<CollegeFollowUpStatus>,
    #[serde(default, deserialize_with = "deserialize_opt_datetime")]
    pub follow_up_date: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<i64>,
}

impl CollegeUpdate {
    pub fn validate(&self) -> Result<(), ServerError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if matches!(self.student_strength, Some(n) if n < 0) {
            return Err(ServerError::BadRequest("studentStrength must not be negative".into()));
        }
        Ok(())
    }

    pub fn tracking_change(&self) -> TrackingChange<CollegePipeline> {
        TrackingChange {
            status: self.status,
            follow_up_status: self.follow_up_status,
            follow_up_date: self.follow_up_date,
            assigned_to_id: self.assigned_to_id,
        }
    }

    pub fn changes_details(&self, college: &College) -> bool {
        text_differs(self.name.as_deref(), &college.name)
            || optional_differs(self.city.as_deref(), college.city.as_deref())
            || optional_differs(self.contact_person.as_deref(), college.contact_person.as_deref())
            || optional_differs(self.phone.as_deref(), college.phone.as_deref())
            || optional_differs(self.email.as_deref(), college.email.as_deref())
            || optional_differs(self.courses.as_deref(), college.courses.as_deref())
            || differs(self.student_strength.as_ref(), college.student_strength.as_ref())
    }
}

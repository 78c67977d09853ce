// src/domain/lead.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::dates::deserialize_opt_datetime;
use crate::domain::enums::{FollowUpStatus, LeadStatus};
use crate::domain::pipeline::{LeadPipeline, TrackingChange};
use crate::domain::records::{ActivityLog, Note, Work};
use crate::domain::{differs, optional_differs, require_text, text_differs};
use crate::errors::ServerError;

/// A prospective real-estate customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub source: Option<String>,
    pub budget: Option<i64>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub requirements: Option<String>,
    pub status: LeadStatus,
    pub follow_up_status: FollowUpStatus,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<i64>,
    pub assigned_to_name: Option<String>,
    pub created_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LeadDetail {
    #[serde(flatten)]
    pub lead: Lead,
    pub notes: Vec<Note>,
    pub works: Vec<Work>,
    pub activity: Vec<ActivityLog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub source: Option<String>,
    pub budget: Option<i64>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub requirements: Option<String>,
    pub status: Option<LeadStatus>,
    pub follow_up_status: Option<FollowUpStatus>,
    #[serde(default, deserialize_with = "deserialize_opt_datetime")]
    pub follow_up_date: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<i64>,
}

impl NewLead {
    /// Checks mandatory fields and returns the follow-up date.
    pub fn validate(&self) -> Result<DateTime<Utc>, ServerError> {
        require_text("name", &self.name)?;
        require_text("phone", &self.phone)?;
        if let Some(budget) = self.budget {
            if budget < 0 {
                return Err(ServerError::BadRequest("budget must not be negative".into()));
            }
        }
        self.follow_up_date
            .ok_or_else(|| ServerError::BadRequest("followUpDate is required".into()))
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    pub budget: Option<i64>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub requirements: Option<String>,
    pub status: Option<LeadStatus>,
    pub follow_up_status: Option<FollowUpStatus>,
    #[serde(default, deserialize_with = "deserialize_opt_datetime")]
    pub follow_up_date: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<i64>,
}

impl LeadUpdate {
    pub fn validate(&self) -> Result<(), ServerError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(phone) = &self.phone {
            require_text("phone", phone)?;
        }
        if matches!(self.budget, Some(b) if b < 0) {
            return Err(ServerError::BadRequest("budget must not be negative".into()));
        }
        Ok(())
    }

    pub fn tracking_change(&self) -> TrackingChange<LeadPipeline> {
        TrackingChange {
            status: self.status,
            follow_up_status: self.follow_up_status,
            follow_up_date: self.follow_up_date,
            assigned_to_id: self.assigned_to_id,
        }
    }

    /// Whether any descriptive (non-tracked) field differs from `lead`.
    /// Text is compared trimmed; a blank optional field clears it.
    pub fn changes_details(&self, lead: &Lead) -> bool {
        text_differs(self.name.as_deref(), &lead.name)
            || text_differs(self.phone.as_deref(), &lead.phone)
            || optional_differs(self.email.as_deref(), lead.email.as_deref())
            || optional_differs(self.source.as_deref(), lead.source.as_deref())
            || differs(self.budget.as_ref(), lead.budget.as_ref())
            || optional_differs(self.location.as_deref(), lead.location.as_deref())
            || optional_differs(self.property_type.as_deref(), lead.property_type.as_deref())
            || optional_differs(self.requirements.as_deref(), lead.requirements.as_deref())
    }
}

// src/domain/pipeline.rs

//! Status bookkeeping shared by the lead and college pipelines.
//!
//! Both pipelines pair a primary `status` with a finer `followUpStatus`. A
//! follow-up change may imply a status change and decides what happens to the
//! parent's open follow-up work. The rule table lives here once and is
//! instantiated per pipeline through [`Pipeline`].

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, ToSql};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::domain::enums::{
    ActivityAction, CollegeFollowUpStatus, CollegeStatus, FollowUpStatus, LeadStatus,
    ParseEnumError,
};

pub trait PipelineEnum:
    'static
    + Copy
    + Eq
    + Ord
    + Hash
    + fmt::Display
    + fmt::Debug
    + FromStr<Err = ParseEnumError>
    + ToSql
    + FromSql
    + Serialize
    + DeserializeOwned
{
    fn all() -> &'static [Self];
    fn as_str(&self) -> &'static str;
}

macro_rules! pipeline_enum {
    ($($ty:ty),+) => {
        $(
            impl PipelineEnum for $ty {
                fn all() -> &'static [Self] {
                    <$ty>::ALL
                }

                fn as_str(&self) -> &'static str {
                    <$ty>::as_str(self)
                }
            }
        )+
    };
}

pipeline_enum!(LeadStatus, FollowUpStatus, CollegeStatus, CollegeFollowUpStatus);

/// Describes one tracked entity kind: its enums, the roles its variants play in
/// the rule table, and the tables its rows live in.
pub trait Pipeline: 'static {
    type Status: PipelineEnum;
    type FollowUp: PipelineEnum;

    /// Human label used in work titles and log lines.
    const LABEL: &'static str;

    const ENTITY_TABLE: &'static str;
    const NOTES_TABLE: &'static str;
    const WORKS_TABLE: &'static str;
    const ACTIVITY_TABLE: &'static str;
    /// Foreign key column on child tables.
    const PARENT_COLUMN: &'static str;
    /// JSON key for the same foreign key.
    const PARENT_KEY: &'static str;
    /// Entity columns matched by free-text search.
    const SEARCH_COLUMNS: &'static [&'static str];

    const INITIAL_STATUS: Self::Status;
    const INITIAL_FOLLOW_UP: Self::FollowUp;

    const CONTACTED: Self::Status;
    const VISITED: Self::Status;
    const WON: Self::Status;
    const LOST: Self::Status;

    const FOLLOW_UP_VISITED: Self::FollowUp;
    const FOLLOW_UP_COMPLETED: Self::FollowUp;
    const FOLLOW_UP_DECLINED: Self::FollowUp;
}

#[derive(Debug)]
pub struct LeadPipeline;

impl Pipeline for LeadPipeline {
    type Status = LeadStatus;
    type FollowUp = FollowUpStatus;

    const LABEL: &'static str = "lead";

    const ENTITY_TABLE: &'static str = "leads";
    const NOTES_TABLE: &'static str = "notes";
    const WORKS_TABLE: &'static str = "works";
    const ACTIVITY_TABLE: &'static str = "activity_logs";
    const PARENT_COLUMN: &'static str = "lead_id";
    const PARENT_KEY: &'static str = "leadId";
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "phone", "email", "location"];

    const INITIAL_STATUS: LeadStatus = LeadStatus::New;
    const INITIAL_FOLLOW_UP: FollowUpStatus = FollowUpStatus::Pending;

    const CONTACTED: LeadStatus = LeadStatus::Contacted;
    const VISITED: LeadStatus = LeadStatus::SiteVisitDone;
    const WON: LeadStatus = LeadStatus::Closed;
    const LOST: LeadStatus = LeadStatus::Lost;

    const FOLLOW_UP_VISITED: FollowUpStatus = FollowUpStatus::SiteVisitDone;
    const FOLLOW_UP_COMPLETED: FollowUpStatus = FollowUpStatus::Completed;
    const FOLLOW_UP_DECLINED: FollowUpStatus = FollowUpStatus::NotNegotiable;
}

#[derive(Debug)]
pub struct CollegePipeline;

impl Pipeline for CollegePipeline {
    type Status = CollegeStatus;
    type FollowUp = CollegeFollowUpStatus;

    const LABEL: &'static str = "college";

    const ENTITY_TABLE: &'static str = "colleges";
    const NOTES_TABLE: &'static str = "college_notes";
    const WORKS_TABLE: &'static str = "college_works";
    const ACTIVITY_TABLE: &'static str = "college_activity_logs";
    const PARENT_COLUMN: &'static str = "college_id";
    const PARENT_KEY: &'static str = "collegeId";
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "city", "contact_person", "phone"];

    const INITIAL_STATUS: CollegeStatus = CollegeStatus::New;
    const INITIAL_FOLLOW_UP: CollegeFollowUpStatus = CollegeFollowUpStatus::Pending;

    const CONTACTED: CollegeStatus = CollegeStatus::Contacted;
    const VISITED: CollegeStatus = CollegeStatus::CampusVisitDone;
    const WON: CollegeStatus = CollegeStatus::Onboarded;
    const LOST: CollegeStatus = CollegeStatus::Rejected;

    const FOLLOW_UP_VISITED: CollegeFollowUpStatus = CollegeFollowUpStatus::CampusVisitDone;
    const FOLLOW_UP_COMPLETED: CollegeFollowUpStatus = CollegeFollowUpStatus::Completed;
    const FOLLOW_UP_DECLINED: CollegeFollowUpStatus = CollegeFollowUpStatus::NotInterested;
}

/// Derives the status implied by moving the follow-up from `previous` to `next`.
/// Returns `status` untouched when no rule fires.
///
/// Rules in precedence order:
/// 1. leaving the visited follow-up maps completed/declined/other to won/lost/contacted
/// 2. entering the visited follow-up sets the visited status
/// 3. completed wins the record unless it is already won or lost
/// 4. declined loses the record unless it is already lost or won
pub fn reconcile_status<P: Pipeline>(
    previous: P::FollowUp,
    next: P::FollowUp,
    status: P::Status,
) -> P::Status {
    if previous == P::FOLLOW_UP_VISITED && next != previous {
        return if next == P::FOLLOW_UP_COMPLETED {
            P::WON
        } else if next == P::FOLLOW_UP_DECLINED {
            P::LOST
        } else {
            P::CONTACTED
        };
    }

    if next == P::FOLLOW_UP_VISITED {
        return P::VISITED;
    }

    let settled = status == P::WON || status == P::LOST;

    if next == P::FOLLOW_UP_COMPLETED && !settled {
        return P::WON;
    }
    if next == P::FOLLOW_UP_DECLINED && !settled {
        return P::LOST;
    }

    status
}

/// True when the follow-up is finished and no further work should stay open.
pub fn is_terminal<P: Pipeline>(follow_up: P::FollowUp) -> bool {
    follow_up == P::FOLLOW_UP_COMPLETED || follow_up == P::FOLLOW_UP_DECLINED
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkAction {
    /// Find or create the single open work and set its due date.
    Schedule(DateTime<Utc>),
    /// Mark every open work completed.
    CloseOpen,
    Keep,
}

/// Decides what happens to open works. `set_follow_up` is the follow-up sent
/// with the update, if any; open works only close when that value is terminal.
pub fn plan_work<P: Pipeline>(
    follow_up: P::FollowUp,
    set_follow_up: Option<P::FollowUp>,
    new_follow_up_date: Option<DateTime<Utc>>,
) -> WorkAction {
    match new_follow_up_date {
        Some(due) if !is_terminal::<P>(follow_up) && follow_up != P::FOLLOW_UP_VISITED => {
            WorkAction::Schedule(due)
        }
        _ if set_follow_up.is_some_and(is_terminal::<P>) => WorkAction::CloseOpen,
        _ => WorkAction::Keep,
    }
}

/// The reconciled fields of a lead or college.
#[derive(Debug)]
pub struct Tracking<P: Pipeline> {
    pub status: P::Status,
    pub follow_up_status: P::FollowUp,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<i64>,
}

// Manual impls: deriving would demand `P: Clone`/`P: PartialEq`.
impl<P: Pipeline> Clone for Tracking<P> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            follow_up_status: self.follow_up_status,
            follow_up_date: self.follow_up_date,
            assigned_to_id: self.assigned_to_id,
        }
    }
}

impl<P: Pipeline> PartialEq for Tracking<P> {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status
            && self.follow_up_status == other.follow_up_status
            && self.follow_up_date == other.follow_up_date
            && self.assigned_to_id == other.assigned_to_id
    }
}

/// Incoming values; `None` means "leave as is".
#[derive(Debug)]
pub struct TrackingChange<P: Pipeline> {
    pub status: Option<P::Status>,
    pub follow_up_status: Option<P::FollowUp>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<i64>,
}

impl<P: Pipeline> Default for TrackingChange<P> {
    fn default() -> Self {
        Self {
            status: None,
            follow_up_status: None,
            follow_up_date: None,
            assigned_to_id: None,
        }
    }
}

/// One audited field change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub action: ActivityAction,
    pub field: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug)]
pub struct TrackingPlan<P: Pipeline> {
    pub next: Tracking<P>,
    pub work: WorkAction,
    pub changes: Vec<FieldChange>,
}

/// Applies an update to the tracked fields and works out its side effects.
pub fn plan_update<P: Pipeline>(current: &Tracking<P>, change: &TrackingChange<P>) -> TrackingPlan<P> {
    let mut status = change.status.unwrap_or(current.status);
    let follow_up_status = change.follow_up_status.unwrap_or(current.follow_up_status);

    if let Some(next) = change.follow_up_status {
        status = reconcile_status::<P>(current.follow_up_status, next, status);
    }

    let next = Tracking {
        status,
        follow_up_status,
        follow_up_date: change.follow_up_date.or(current.follow_up_date),
        assigned_to_id: change.assigned_to_id.or(current.assigned_to_id),
    };

    let work = plan_work::<P>(next.follow_up_status, change.follow_up_status, change.follow_up_date);
    let changes = diff(current, &next);

    TrackingPlan { next, work, changes }
}

/// Tracked fields for a freshly created record.
pub fn initial_tracking<P: Pipeline>(
    status: Option<P::Status>,
    follow_up_status: Option<P::FollowUp>,
    follow_up_date: DateTime<Utc>,
    assigned_to_id: Option<i64>,
) -> Tracking<P> {
    let follow_up = follow_up_status.unwrap_or(P::INITIAL_FOLLOW_UP);
    let status = status.unwrap_or(P::INITIAL_STATUS);
    let status = match follow_up_status {
        Some(next) => reconcile_status::<P>(P::INITIAL_FOLLOW_UP, next, status),
        None => status,
    };

    Tracking {
        status,
        follow_up_status: follow_up,
        follow_up_date: Some(follow_up_date),
        assigned_to_id,
    }
}

fn diff<P: Pipeline>(old: &Tracking<P>, new: &Tracking<P>) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    // Compares one field and records it when it moved.
    macro_rules! track {
        ($field:ident, $name:literal, $action:expr, $fmt:expr) => {
            if old.$field != new.$field {
                changes.push(FieldChange {
                    action: $action,
                    field: $name,
                    old_value: $fmt(&old.$field),
                    new_value: $fmt(&new.$field),
                });
            }
        };
    }

    track!(status, "status", ActivityAction::StatusChanged, |s: &P::Status| Some(
        s.to_string()
    ));
    track!(
        follow_up_status,
        "followUpStatus",
        ActivityAction::FollowUpStatusChanged,
        |s: &P::FollowUp| Some(s.to_string())
    );
    track!(
        follow_up_date,
        "followUpDate",
        ActivityAction::FollowUpDateChanged,
        |d: &Option<DateTime<Utc>>| d.map(|d| d.to_rfc3339())
    );
    track!(
        assigned_to_id,
        "assignedToId",
        ActivityAction::AssigneeChanged,
        |id: &Option<i64>| id.map(|id| id.to_string())
    );

    changes
}

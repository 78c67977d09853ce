// src/domain/enums.rs

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a string-backed enum stored as TEXT and exchanged as
/// SCREAMING_SNAKE_CASE in JSON.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $( $text => Ok($name::$variant), )+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: ParseEnumError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

string_enum!(
    /// Primary lifecycle of a real-estate lead.
    LeadStatus, "lead status" {
        New => "NEW",
        Contacted => "CONTACTED",
        SiteVisitDone => "SITE_VISIT_DONE",
        Negotiation => "NEGOTIATION",
        Closed => "CLOSED",
        Lost => "LOST",
    }
);

string_enum!(
    /// Finer-grained follow-up state layered on top of [`LeadStatus`].
    FollowUpStatus, "follow-up status" {
        Pending => "PENDING",
        SelectDate => "SELECT_DATE",
        Completed => "COMPLETED",
        NotNegotiable => "NOT_NEGOTIABLE",
        Interested => "INTERESTED",
        FollowUpLater => "FOLLOW_UP_LATER",
        NotResponding => "NOT_RESPONDING",
        SiteVisitDone => "SITE_VISIT_DONE",
    }
);

string_enum!(
    CollegeStatus, "college status" {
        New => "NEW",
        Contacted => "CONTACTED",
        CampusVisitDone => "CAMPUS_VISIT_DONE",
        Negotiation => "NEGOTIATION",
        Onboarded => "ONBOARDED",
        Rejected => "REJECTED",
    }
);

string_enum!(
    CollegeFollowUpStatus, "college follow-up status" {
        Pending => "PENDING",
        SelectDate => "SELECT_DATE",
        Completed => "COMPLETED",
        NotInterested => "NOT_INTERESTED",
        Interested => "INTERESTED",
        FollowUpLater => "FOLLOW_UP_LATER",
        NotResponding => "NOT_RESPONDING",
        CampusVisitDone => "CAMPUS_VISIT_DONE",
    }
);

string_enum!(
    WorkStatus, "work status" {
        Pending => "PENDING",
        Completed => "COMPLETED",
    }
);

string_enum!(
    Role, "role" {
        Agent => "AGENT",
        Admin => "ADMIN",
    }
);

string_enum!(
    /// What an activity log row records.
    ActivityAction, "activity action" {
        Created => "CREATED",
        Updated => "UPDATED",
        StatusChanged => "STATUS_CHANGED",
        FollowUpStatusChanged => "FOLLOW_UP_STATUS_CHANGED",
        FollowUpDateChanged => "FOLLOW_UP_DATE_CHANGED",
        AssigneeChanged => "ASSIGNEE_CHANGED",
        NoteAdded => "NOTE_ADDED",
        WorkCompleted => "WORK_COMPLETED",
    }
);

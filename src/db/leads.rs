// src/db/leads.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::activity::{self, Entry};
use crate::db::tracking::{self, ListQuery};
use crate::db::{notes, works};
use crate::domain::{clean, merge_text};
use crate::domain::enums::ActivityAction;
use crate::domain::lead::{Lead, LeadDetail, LeadUpdate, NewLead};
use crate::domain::pipeline::{initial_tracking, plan_update, LeadPipeline};
use crate::domain::user::{AuthUser, Scope};
use crate::errors::ServerError;

type L = LeadPipeline;

const SELECT_LEAD: &str = r#"
    select
        e.id, e.name, e.phone, e.email, e.source, e.budget, e.location,
        e.property_type, e.requirements, e.status, e.follow_up_status, e.follow_up_date,
        e.assigned_to_id, u.name, e.created_by_id, e.created_at, e.updated_at
    from leads e
    left join users u on u.id = e.assigned_to_id
"#;

fn lead_from_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        source: row.get(4)?,
        budget: row.get(5)?,
        location: row.get(6)?,
        property_type: row.get(7)?,
        requirements: row.get(8)?,
        status: row.get(9)?,
        follow_up_status: row.get(10)?,
        follow_up_date: row.get(11)?,
        assigned_to_id: row.get(12)?,
        assigned_to_name: row.get(13)?,
        created_by_id: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn find_lead(conn: &Connection, id: i64) -> Result<Lead, ServerError> {
    conn.query_row(&format!("{SELECT_LEAD} where e.id = ?"), params![id], lead_from_row)
        .optional()?
        .ok_or_else(|| ServerError::NotFound(format!("lead {id} not found")))
}

/// Loads a lead the caller may see.
pub fn get_lead(conn: &Connection, id: i64, scope: Scope) -> Result<Lead, ServerError> {
    tracking::ensure_visible::<L>(conn, id, scope)?;
    find_lead(conn, id)
}

pub fn lead_detail(conn: &Connection, id: i64, scope: Scope) -> Result<LeadDetail, ServerError> {
    let lead = get_lead(conn, id, scope)?;
    Ok(LeadDetail {
        notes: notes::list_notes::<L>(conn, id)?,
        works: works::list_for_parent::<L>(conn, id)?,
        activity: activity::list_for::<L>(conn, id)?,
        lead,
    })
}

pub fn list_leads(
    conn: &Connection,
    scope: Scope,
    query: &ListQuery<L>,
) -> Result<Vec<Lead>, ServerError> {
    let (clause, mut values) = query.where_clause(scope);
    values.push(query.limit.into());
    values.push(query.offset.into());

    let sql = format!("{SELECT_LEAD} where {clause} order by e.updated_at desc, e.id desc limit ? offset ?");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values), lead_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Creates a lead with its first follow-up work and a CREATED audit row.
///
/// The work insert is best effort: a failure is logged and the lead is kept.
pub fn create_lead(
    conn: &mut Connection,
    input: &NewLead,
    actor: &AuthUser,
    now: DateTime<Utc>,
) -> Result<Lead, ServerError> {
    let due = input.validate()?;
    let assigned_to_id = tracking::creation_assignee::<L>(actor, input.assigned_to_id)?;

    let tx = conn.transaction()?;
    tracking::check_assignee(&tx, assigned_to_id)?;

    let t = initial_tracking::<L>(input.status, input.follow_up_status, due, assigned_to_id);
    tx.execute(
        r#"
        insert into leads (
            name, phone, email, source, budget, location, property_type, requirements,
            status, follow_up_status, follow_up_date, assigned_to_id, created_by_id,
            created_at, updated_at
        ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
        "#,
        params![
            input.name.trim(),
            input.phone.trim(),
            clean(input.email.as_deref()),
            clean(input.source.as_deref()),
            input.budget,
            clean(input.location.as_deref()),
            clean(input.property_type.as_deref()),
            clean(input.requirements.as_deref()),
            t.status,
            t.follow_up_status,
            t.follow_up_date,
            t.assigned_to_id,
            actor.id,
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();

    activity::record::<L>(&tx, id, Some(actor.id), Entry::action(ActivityAction::Created), now)?;

    let title = tracking::work_title::<L>(&input.name);
    if let Err(e) = works::insert_work::<L>(&tx, id, t.assigned_to_id, &title, due, now) {
        tracing::warn!(lead_id = id, error = %e, "could not create follow-up work for new lead");
    }

    let lead = find_lead(&tx, id)?;
    tx.commit()?;

    tracing::info!(lead_id = id, actor = actor.id, "lead created");
    Ok(lead)
}

/// Applies a partial update, reconciling status and follow-up work.
pub fn update_lead(
    conn: &mut Connection,
    id: i64,
    update: &LeadUpdate,
    actor: &AuthUser,
    now: DateTime<Utc>,
) -> Result<Lead, ServerError> {
    update.validate()?;

    let tx = conn.transaction()?;
    let current_tracking = tracking::load_tracking::<L>(&tx, id, actor.scope())?;
    let current = find_lead(&tx, id)?;

    tracking::check_reassign::<L>(actor, current.assigned_to_id, update.assigned_to_id)?;
    tracking::check_assignee(&tx, update.assigned_to_id)?;

    if update.changes_details(&current) {
        tx.execute(
            r#"
            update leads set
                name = ?1,
                phone = ?2,
                email = ?3,
                source = ?4,
                budget = coalesce(?5, budget),
                location = ?6,
                property_type = ?7,
                requirements = ?8,
                updated_at = ?9
            where id = ?10
            "#,
            params![
                update.name.as_deref().map_or(current.name.as_str(), str::trim),
                update.phone.as_deref().map_or(current.phone.as_str(), str::trim),
                merge_text(update.email.as_deref(), current.email.as_deref()),
                merge_text(update.source.as_deref(), current.source.as_deref()),
                update.budget,
                merge_text(update.location.as_deref(), current.location.as_deref()),
                merge_text(update.property_type.as_deref(), current.property_type.as_deref()),
                merge_text(update.requirements.as_deref(), current.requirements.as_deref()),
                now,
                id,
            ],
        )?;
        activity::record::<L>(&tx, id, Some(actor.id), Entry::action(ActivityAction::Updated), now)?;
    }

    let name = update.name.as_deref().map_or(current.name.as_str(), str::trim);
    let plan = plan_update(&current_tracking, &update.tracking_change());
    tracking::apply_plan(&tx, id, name, &plan, actor.id, now)?;

    let lead = find_lead(&tx, id)?;
    tx.commit()?;

    tracing::debug!(
        lead_id = id,
        status = %lead.status,
        follow_up_status = %lead.follow_up_status,
        changes = plan.changes.len(),
        "lead updated"
    );
    Ok(lead)
}

pub fn delete_lead(conn: &Connection, id: i64) -> Result<(), ServerError> {
    let n = conn.execute("delete from leads where id = ?", params![id])?;
    if n == 0 {
        return Err(ServerError::NotFound(format!("lead {id} not found")));
    }
    Ok(())
}

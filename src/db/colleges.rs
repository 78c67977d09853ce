// src/db/colleges.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::activity::{self, Entry};
use crate::db::tracking::{self, ListQuery};
use crate::db::{notes, works};
use crate::domain::{clean, merge_text};
use crate::domain::college::{College, CollegeDetail, CollegeUpdate, NewCollege};
use crate::domain::enums::ActivityAction;
use crate::domain::pipeline::{initial_tracking, plan_update, CollegePipeline};
use crate::domain::user::{AuthUser, Scope};
use crate::errors::ServerError;

type C = CollegePipeline;

const SELECT_COLLEGE: &str = r#"
    select
        e.id, e.name, e.city, e.contact_person, e.phone, e.email, e.courses,
        e.student_strength, e.status, e.follow_up_status, e.follow_up_date,
        e.assigned_to_id, u.name, e.created_by_id, e.created_at, e.updated_at
    from colleges e
    left join users u on u.id = e.assigned_to_id
"#;

fn college_from_row(row: &Row<'_>) -> rusqlite::Result<College> {
    Ok(College {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        contact_person: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        courses: row.get(6)?,
        student_strength: row.get(7)?,
        status: row.get(8)?,
        follow_up_status: row.get(9)?,
        follow_up_date: row.get(10)?,
        assigned_to_id: row.get(11)?,
        assigned_to_name: row.get(12)?,
        created_by_id: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn find_college(conn: &Connection, id: i64) -> Result<College, ServerError> {
    conn.query_row(&format!("{SELECT_COLLEGE} where e.id = ?"), params![id], college_from_row)
        .optional()?
        .ok_or_else(|| ServerError::NotFound(format!("college {id} not found")))
}

pub fn get_college(conn: &Connection, id: i64, scope: Scope) -> Result<College, ServerError> {
    tracking::ensure_visible::<C>(conn, id, scope)?;
    find_college(conn, id)
}

pub fn college_detail(conn: &Connection, id: i64, scope: Scope) -> Result<CollegeDetail, ServerError> {
    let college = get_college(conn, id, scope)?;
    Ok(CollegeDetail {
        notes: notes::list_notes::<C>(conn, id)?,
        works: works::list_for_parent::<C>(conn, id)?,
        activity: activity::list_for::<C>(conn, id)?,
        college,
    })
}

pub fn list_colleges(
    conn: &Connection,
    scope: Scope,
    query: &ListQuery<C>,
) -> Result<Vec<College>, ServerError> {
    let (clause, mut values) = query.where_clause(scope);
    values.push(query.limit.into());
    values.push(query.offset.into());

    let sql = format!(
        "{SELECT_COLLEGE} where {clause} order by e.updated_at desc, e.id desc limit ? offset ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values), college_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn create_college(
    conn: &mut Connection,
    input: &NewCollege,
    actor: &AuthUser,
    now: DateTime<Utc>,
) -> Result<College, ServerError> {
    let due = input.validate()?;
    let assigned_to_id = tracking::creation_assignee::<C>(actor, input.assigned_to_id)?;

    let tx = conn.transaction()?;
    tracking::check_assignee(&tx, assigned_to_id)?;

    let t = initial_tracking::<C>(input.status, input.follow_up_status, due, assigned_to_id);
    tx.execute(
        r#"
        insert into colleges (
            name, city, contact_person, phone, email, courses, student_strength,
            status, follow_up_status, follow_up_date, assigned_to_id, created_by_id,
            created_at, updated_at
        ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
        "#,
        params![
            input.name.trim(),
            clean(input.city.as_deref()),
            clean(input.contact_person.as_deref()),
            clean(input.phone.as_deref()),
            clean(input.email.as_deref()),
            clean(input.courses.as_deref()),
            input.student_strength,
            t.status,
            t.follow_up_status,
            t.follow_up_date,
            t.assigned_to_id,
            actor.id,
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();

    activity::record::<C>(&tx, id, Some(actor.id), Entry::action(ActivityAction::Created), now)?;

    let title = tracking::work_title::<C>(&input.name);
    if let Err(e) = works::insert_work::<C>(&tx, id, t.assigned_to_id, &title, due, now) {
        tracing::warn!(college_id = id, error = %e, "could not create follow-up work for new college");
    }

    let college = find_college(&tx, id)?;
    tx.commit()?;

    tracing::info!(college_id = id, actor = actor.id, "college created");
    Ok(college)
}

pub fn update_college(
    conn: &mut Connection,
    id: i64,
    update: &CollegeUpdate,
    actor: &AuthUser,
    now: DateTime<Utc>,
) -> Result<College, ServerError> {
    update.validate()?;

    let tx = conn.transaction()?;
    let current_tracking = tracking::load_tracking::<C>(&tx, id, actor.scope())?;
    let current = find_college(&tx, id)?;

    tracking::check_reassign::<C>(actor, current.assigned_to_id, update.assigned_to_id)?;
    tracking::check_assignee(&tx, update.assigned_to_id)?;

    if update.changes_details(&current) {
        tx.execute(
            r#"
            update colleges set
                name = ?1,
                city = ?2,
                contact_person = ?3,
                phone = ?4,
                email = ?5,
                courses = ?6,
                student_strength = coalesce(?7, student_strength),
                updated_at = ?8
            where id = ?9
            "#,
            params![
                update.name.as_deref().map_or(current.name.as_str(), str::trim),
                merge_text(update.city.as_deref(), current.city.as_deref()),
                merge_text(update.contact_person.as_deref(), current.contact_person.as_deref()),
                merge_text(update.phone.as_deref(), current.phone.as_deref()),
                merge_text(update.email.as_deref(), current.email.as_deref()),
                merge_text(update.courses.as_deref(), current.courses.as_deref()),
                update.student_strength,
                now,
                id,
            ],
        )?;
        activity::record::<C>(&tx, id, Some(actor.id), Entry::action(ActivityAction::Updated), now)?;
    }

    let name = update.name.as_deref().map_or(current.name.as_str(), str::trim);
    let plan = plan_update(&current_tracking, &update.tracking_change());
    tracking::apply_plan(&tx, id, name, &plan, actor.id, now)?;

    let college = find_college(&tx, id)?;
    tx.commit()?;

    tracing::debug!(
        college_id = id,
        status = %college.status,
        follow_up_status = %college.follow_up_status,
        changes = plan.changes.len(),
        "college updated"
    );
    Ok(college)
}

pub fn delete_college(conn: &Connection, id: i64) -> Result<(), ServerError> {
    let n = conn.execute("delete from colleges where id = ?", params![id])?;
    if n == 0 {
        return Err(ServerError::NotFound(format!("college {id} not found")));
    }
    Ok(())
}

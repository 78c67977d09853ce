use crate::domain::college::College;
use crate::domain::lead::Lead;
use crate::errors::ServerError;
use crate::responses::xlsx_response;
use crate::responses::ResultResp;
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One spreadsheet cell.
enum Cell<'a> {
    Text(&'a str),
    Number(Option<i64>),
    Date(Option<DateTime<Utc>>),
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str]) -> Result<(), ServerError> {
    let bold = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(|e| {
                ServerError::XlsxError(format!("Failed to write header '{}': {}", header, e))
            })?;
    }
    Ok(())
}

fn write_row(sheet: &mut Worksheet, row: u32, cells: &[Cell<'_>]) -> Result<(), ServerError> {
    for (col, cell) in cells.iter().enumerate() {
        let col = col as u16;
        let res = match cell {
            Cell::Text(s) => sheet.write_string(row, col, *s).map(|_| ()),
            Cell::Number(Some(n)) => sheet.write_number(row, col, *n as f64).map(|_| ()),
            Cell::Date(Some(d)) => sheet
                .write_string(row, col, d.format(DATE_FORMAT).to_string())
                .map(|_| ()),
            Cell::Number(None) | Cell::Date(None) => Ok(()),
        };
        res.map_err(|e| {
            ServerError::XlsxError(format!("Failed to write row {row}, column {col}: {e}"))
        })?;
    }
    Ok(())
}

fn opt(s: &Option<String>) -> Cell<'_> {
    Cell::Text(s.as_deref().unwrap_or(""))
}

fn save(mut workbook: Workbook) -> Result<Vec<u8>, ServerError> {
    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {}", e)))
}

pub fn leads_workbook(leads: &[Lead]) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name("Leads")
        .map_err(|e| ServerError::XlsxError(format!("Failed to name sheet: {}", e)))?;

    write_headers(
        sheet,
        &[
            "ID",
            "Name",
            "Phone",
            "Email",
            "Source",
            "Budget",
            "Location",
            "Property Type",
            "Requirements",
            "Status",
            "Follow-up Status",
            "Follow-up Date",
            "Assigned To",
            "Created",
        ],
    )?;

    for (i, lead) in leads.iter().enumerate() {
        write_row(
            sheet,
            (i + 1) as u32,
            &[
                Cell::Number(Some(lead.id)),
                Cell::Text(&lead.name),
                Cell::Text(&lead.phone),
                opt(&lead.email),
                opt(&lead.source),
                Cell::Number(lead.budget),
                opt(&lead.location),
                opt(&lead.property_type),
                opt(&lead.requirements),
                Cell::Text(lead.status.as_str()),
                Cell::Text(lead.follow_up_status.as_str()),
                Cell::Date(lead.follow_up_date),
                opt(&lead.assigned_to_name),
                Cell::Date(Some(lead.created_at)),
            ],
        )?;
    }

    save(workbook)
}

pub fn colleges_workbook(colleges: &[College]) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name("Colleges")
        .map_err(|e| ServerError::XlsxError(format!("Failed to name sheet: {}", e)))?;

    write_headers(
        sheet,
        &[
            "ID",
            "Name",
            "City",
            "Contact Person",
            "Phone",
            "Email",
            "Courses",
            "Student Strength",
            "Status",
            "Follow-up Status",
            "Follow-up Date",
            "Assigned To",
            "Created",
        ],
    )?;

    for (i, college) in colleges.iter().enumerate() {
        write_row(
            sheet,
            (i + 1) as u32,
            &[
                Cell::Number(Some(college.id)),
                Cell::Text(&college.name),
                opt(&college.city),
                opt(&college.contact_person),
                opt(&college.phone),
                opt(&college.email),
                opt(&college.courses),
                Cell::Number(college.student_strength),
                Cell::Text(college.status.as_str()),
                Cell::Text(college.follow_up_status.as_str()),
                Cell::Date(college.follow_up_date),
                opt(&college.assigned_to_name),
                Cell::Date(Some(college.created_at)),
            ],
        )?;
    }

    save(workbook)
}

pub fn export_leads_xlsx(leads: &[Lead], today: DateTime<Utc>) -> ResultResp {
    let buffer = leads_workbook(leads)?;
    xlsx_response(buffer, &format!("leads_{}.xlsx", today.format("%Y-%m-%d")))
}

pub fn export_colleges_xlsx(colleges: &[College], today: DateTime<Utc>) -> ResultResp {
    let buffer = colleges_workbook(colleges)?;
    xlsx_response(buffer, &format!("colleges_{}.xlsx", today.format("%Y-%m-%d")))
}

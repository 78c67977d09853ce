pub mod export_xlsx;

pub use export_xlsx::{export_colleges_xlsx, export_leads_xlsx};

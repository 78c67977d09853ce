mod access_tests;
mod college_tests;
mod dashboard_tests;
mod lead_tests;
mod work_note_tests;

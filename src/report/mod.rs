//! Report output: Markdown/JSON dashboards and CSV export.

pub mod csv_export;
pub mod generator;

pub use csv_export::{default_export_name, write_csv};
pub use generator::{generate_json_report, generate_markdown_report, RenderOptions};

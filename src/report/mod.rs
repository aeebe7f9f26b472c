//! Reporting: text rendering, remediation hints, and artifact persistence.
mod hints;
mod persist;
mod render;

pub use persist::{append_history, load_json_optional, write_json};
pub use render::{render_inventory, render_plan, render_report, render_validation};

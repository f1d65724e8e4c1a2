//! Printable rendering of a finished plan.

use std::fmt::Write;

use super::model::BirthPlan;
use super::schema;

/// Statement closing every printed plan.
pub const CLOSING_STATEMENT: &str = "This birth plan represents our preferences for labor and \
delivery. We understand that circumstances may require flexibility, and we trust our healthcare \
team to make necessary medical decisions while respecting our preferences when possible.";

impl BirthPlan {
    /// Render the plan as a Markdown document, sections in registry order.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Birth Plan\n");

        for section in schema::sections() {
            let _ = write!(out, "\n## {}\n\n", section.title);
            for field in section.fields {
                let value = self.get(section.key, field.key).unwrap_or_default();
                let _ = writeln!(out, "- **{}:** {}", field.label, value.trim());
            }
        }

        let notes = self.additional_notes.trim();
        if !notes.is_empty() {
            let _ = write!(out, "\n## Additional Notes\n\n{notes}\n");
        }

        let _ = write!(out, "\n---\n\n_{CLOSING_STATEMENT}_\n");
        out
    }
}

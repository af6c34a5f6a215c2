//! TUI rendering traits for shiftcal-core types.

use owo_colors::OwoColorize;
use shiftcal_core::event::CalendarInfo;
use shiftcal_core::sync::{PeriodCounts, RecordFailure};
use shiftcal_core::{MigrationReport, SubPeriodIndex, SyncReport};

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for CalendarInfo {
    fn render(&self) -> String {
        format!(
            "📅 {} {}",
            self.display_name,
            format!("{} · {}", self.account_name, self.id).dimmed()
        )
    }
}

impl Render for PeriodCounts {
    fn render(&self) -> String {
        format!(
            "{} created, {} repaired, {} up to date",
            self.created.green(),
            self.repaired.yellow(),
            self.skipped.dimmed()
        )
    }
}

impl Render for RecordFailure {
    fn render(&self) -> String {
        format!("{} {}: {}", "✗".red(), self.record_id, self.message.red())
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        for index in SubPeriodIndex::ALL {
            let counts = self.counts(index);
            if *counts != PeriodCounts::default() {
                lines.push(format!("   {} {}", index.bold(), counts.render()));
            }
        }

        if lines.is_empty() {
            lines.push(format!("   {}", "No services to mirror".dimmed()));
        }

        match &self.orphans {
            Some(orphans) if orphans.deleted > 0 || orphans.failed > 0 => lines.push(format!(
                "   Removed {} stale events ({} failed)",
                orphans.deleted, orphans.failed
            )),
            None if !self.is_clean() => lines.push(format!(
                "   {}",
                "Cleanup postponed until failures are resolved".dimmed()
            )),
            _ => {}
        }

        for failure in &self.failures {
            lines.push(format!("   {}", failure.render()));
        }

        lines.join("\n")
    }
}

impl Render for MigrationReport {
    fn render(&self) -> String {
        let mut lines = vec![format!(
            "   Removed {} events from the old calendar",
            self.purged.red()
        )];

        if self.purge_failures > 0 {
            lines.push(format!(
                "   {} events could not be removed and stay behind",
                self.purge_failures.yellow()
            ));
        }

        lines.push(format!("   Reset links of {} records", self.links_reset));
        lines.push(self.sync.render());
        lines.join("\n")
    }
}

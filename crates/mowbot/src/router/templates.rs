//! Screen text formatting.
//!
//! Plain-text blocks shared by every handler, so the dashboards keep one
//! voice. No markup: the transport renders these verbatim.

use chrono::Duration;

use crate::store::{Job, JobStatus, Note};

pub const SEPARATOR: &str = "────────────────────";

pub fn status_emoji(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "⏳",
        JobStatus::InProgress => "🔄",
        JobStatus::Completed => "✅",
    }
}

pub fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "Pending",
        JobStatus::InProgress => "In progress",
        JobStatus::Completed => "Completed",
    }
}

pub fn dashboard_header(name: &str, role: &str) -> String {
    format!("👋 {} — {} Dashboard\n{}", name, role, SEPARATOR)
}

pub fn job_list_header(title: &str, count: usize) -> String {
    format!("📋 {} ({})\n{}", title, count, SEPARATOR)
}

/// Formats a duration as `H:MM:SS`, dropping sub-second noise.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// The per-job detail card: status line, duration, recent notes, photo
/// count for the effective date.
pub fn job_card(job: &Job, notes: &[Note], photo_count: usize) -> String {
    let mut lines = vec![format!(
        "{} {} [{}]",
        status_emoji(job.status),
        job.site_name,
        status_label(job.status)
    )];

    if let Some(area) = &job.area {
        lines.push(format!("Area: {}", area));
    }
    match job.duration() {
        Some(duration) => lines.push(format!("Duration: {}", format_duration(duration))),
        None => lines.push("Duration: N/A".to_string()),
    }
    if photo_count > 0 {
        lines.push(format!("Photos: {}", photo_count));
    }
    if !notes.is_empty() {
        lines.push("Notes:".to_string());
        for note in notes {
            lines.push(format!("  • [{}] {}", note.author_role, note.text));
        }
    }

    lines.join("\n")
}

pub fn site_info(
    site_name: &str,
    contact: Option<&str>,
    gate_code: Option<&str>,
    address: Option<&str>,
) -> String {
    let mut lines = vec![format!("ℹ️ Site info — {}", site_name)];
    if let Some(address) = address {
        lines.push(format!("Address: {}", address));
    }
    if let Some(contact) = contact {
        lines.push(format!("Contact: {}", contact));
    }
    if let Some(gate_code) = gate_code {
        lines.push(format!("Gate code: {}", gate_code));
    }
    lines.join("\n")
}

pub fn success(title: &str, body: &str) -> String {
    format!("✅ {}\n\n{}", title, body)
}

pub fn error(title: &str, body: &str) -> String {
    format!("⚠️ {}\n\n{}", title, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn job() -> Job {
        Job {
            id: 1,
            site_name: "Trinity lodge".to_string(),
            quote: None,
            address: None,
            order_no: None,
            area: Some("Grounds".to_string()),
            summer_schedule: None,
            winter_schedule: None,
            contact: None,
            gate_code: None,
            map_link: None,
            assigned_to: None,
            status: JobStatus::Completed,
            photos: Vec::new(),
            start_time: Some(Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()),
            finish_time: Some(Utc.with_ymd_and_hms(2026, 3, 2, 10, 30, 0).unwrap()),
            scheduled_date: None,
            priority: "normal".to_string(),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(3723)), "1:02:03");
        assert_eq!(format_duration(Duration::seconds(59)), "0:00:59");
        assert_eq!(format_duration(Duration::seconds(-5)), "0:00:00");
    }

    #[test]
    fn test_job_card_contains_status_duration_and_notes() {
        let notes = vec![Note {
            author_id: 7,
            author_role: "employee".to_string(),
            text: "Hedge needs a second pass".to_string(),
            created_at: None,
        }];
        let card = job_card(&job(), &notes, 3);

        assert!(card.contains("Trinity lodge"));
        assert!(card.contains("[Completed]"));
        assert!(card.contains("Duration: 2:30:00"));
        assert!(card.contains("Photos: 3"));
        assert!(card.contains("Hedge needs a second pass"));
    }

    #[test]
    fn test_job_card_without_photos_or_notes() {
        let card = job_card(&job(), &[], 0);
        assert!(!card.contains("Photos:"));
        assert!(!card.contains("Notes:"));
    }

    #[test]
    fn test_site_info_skips_missing_fields() {
        let text = site_info("Magpie cottage", None, Some("1275"), None);
        assert!(text.contains("Gate code: 1275"));
        assert!(!text.contains("Contact:"));
        assert!(!text.contains("Address:"));
    }
}

//! Builders for seeding test data without repetitive boilerplate.

#![allow(dead_code)]

use mowbot::db::job_repo::{self, JobRow};
use mowbot::store::{JobId, JobStore, UserId};

/// Builder for inserting job rows.
pub struct JobBuilder {
    row: JobRow,
}

impl JobBuilder {
    pub fn new(site_name: &str) -> Self {
        Self {
            row: JobRow {
                id: 0,
                site_name: site_name.to_string(),
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
                status: "pending".to_string(),
                photos: String::new(),
                start_time: None,
                finish_time: None,
                scheduled_date: None,
                priority: "normal".to_string(),
            },
        }
    }

    pub fn area(mut self, area: &str) -> Self {
        self.row.area = Some(area.to_string());
        self
    }

    pub fn no_area(mut self) -> Self {
        self.row.area = None;
        self
    }

    pub fn address(mut self, address: &str) -> Self {
        self.row.address = Some(address.to_string());
        self
    }

    pub fn contact(mut self, contact: &str) -> Self {
        self.row.contact = Some(contact.to_string());
        self
    }

    pub fn gate_code(mut self, gate_code: &str) -> Self {
        self.row.gate_code = Some(gate_code.to_string());
        self
    }

    pub fn map_link(mut self, link: &str) -> Self {
        self.row.map_link = Some(link.to_string());
        self
    }

    pub fn assigned_to(mut self, employee: UserId) -> Self {
        self.row.assigned_to = Some(employee);
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.row.status = status.to_string();
        self
    }

    pub fn scheduled_date(mut self, date: &str) -> Self {
        self.row.scheduled_date = Some(date.to_string());
        self
    }

    pub fn insert(self, store: &JobStore) -> JobId {
        job_repo::insert(store.database(), &self.row).expect("insert test job")
    }
}

//! Role roster — maps user ids to the three fixed roles.
//!
//! Role resolution is a plain lookup against the configured roster; there
//! is no further authorization model. Devs may drive both dashboards.

use std::collections::{BTreeMap, HashSet};

use crate::config::schema::RosterConfig;

/// The caller's resolved role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Dev,
    Director,
    Employee,
    Unauthorized,
}

impl Role {
    /// Stable lowercase name, used as the note author role in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Dev => "dev",
            Role::Director => "director",
            Role::Employee => "employee",
            Role::Unauthorized => "unauthorized",
        }
    }
}

/// Configured users by role. Employee and director entries carry display
/// names for dashboards and assignment buttons.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    devs: HashSet<i64>,
    directors: BTreeMap<i64, String>,
    employees: BTreeMap<i64, String>,
}

impl Roster {
    pub fn from_config(config: &RosterConfig) -> Self {
        Self {
            devs: config.devs.iter().copied().collect(),
            directors: config
                .directors
                .iter()
                .map(|m| (m.id, m.name.clone()))
                .collect(),
            employees: config
                .employees
                .iter()
                .map(|m| (m.id, m.name.clone()))
                .collect(),
        }
    }

    /// Resolves a user's role. Dev wins over the other roles so a dev id
    /// listed elsewhere still gets the dev dashboard.
    pub fn role(&self, user_id: i64) -> Role {
        if self.devs.contains(&user_id) {
            Role::Dev
        } else if self.directors.contains_key(&user_id) {
            Role::Director
        } else if self.employees.contains_key(&user_id) {
            Role::Employee
        } else {
            Role::Unauthorized
        }
    }

    /// Display name for a roster member, falling back through the role maps.
    pub fn display_name(&self, user_id: i64) -> Option<&str> {
        self.employees
            .get(&user_id)
            .or_else(|| self.directors.get(&user_id))
            .map(String::as_str)
    }

    pub fn employee_name(&self, user_id: i64) -> Option<&str> {
        self.employees.get(&user_id).map(String::as_str)
    }

    /// Employees in stable id order, for building choice menus.
    pub fn employees(&self) -> impl Iterator<Item = (i64, &str)> {
        self.employees.iter().map(|(id, name)| (*id, name.as_str()))
    }
}

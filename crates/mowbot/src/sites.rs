//! Static site directory overrides.
//!
//! Contact and gate-code details change in the field faster than the job
//! rows do; the configured directory wins over whatever is stored.

use std::collections::HashMap;

use crate::config::schema::SitesConfig;

#[derive(Debug, Clone, Default)]
pub struct SiteOverride {
    pub contact: Option<String>,
    pub gate_code: Option<String>,
}

/// Lookup of per-site overrides keyed by site name.
#[derive(Debug, Clone, Default)]
pub struct SiteDirectory {
    overrides: HashMap<String, SiteOverride>,
}

impl SiteDirectory {
    pub fn from_config(config: &SitesConfig) -> Self {
        Self {
            overrides: config
                .overrides
                .iter()
                .map(|(name, o)| {
                    (
                        name.clone(),
                        SiteOverride {
                            contact: o.contact.clone(),
                            gate_code: o.gate_code.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Applies any configured overrides for a site to the stored contact
    /// and gate code, returning the effective pair.
    pub fn apply(
        &self,
        site_name: &str,
        contact: Option<String>,
        gate_code: Option<String>,
    ) -> (Option<String>, Option<String>) {
        match self.overrides.get(site_name) {
            Some(o) => (
                o.contact.clone().or(contact),
                o.gate_code.clone().or(gate_code),
            ),
            None => (contact, gate_code),
        }
    }
}

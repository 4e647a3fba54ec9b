use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
}

/// Form body of `POST /dashboard`.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    pub name: Option<String>,
}

/// What the dashboard shows about the signed-in user.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub email: String,
    // Left out when unset so templates fall back to their placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub member_since: String,
}

impl From<User> for ProfileView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            member_since: user.created_at.date().to_string(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Profile,
    Activities,
    Stats,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Profile, Tab::Activities, Tab::Stats];

    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("activities") => Tab::Activities,
            Some("stats") => Tab::Stats,
            _ => Tab::Profile,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Tab::Profile => "profile",
            Tab::Activities => "activities",
            Tab::Stats => "stats",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Profile => "Profile",
            Tab::Activities => "Activities",
            Tab::Stats => "Stats",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TabLink {
    pub slug: &'static str,
    pub label: &'static str,
}

impl From<Tab> for TabLink {
    fn from(tab: Tab) -> Self {
        Self {
            slug: tab.slug(),
            label: tab.label(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Stat {
    pub label: &'static str,
    pub value: &'static str,
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Applicant,
    Recruiter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Recruiter => "recruiter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "applicant" => Ok(Role::Applicant),
            "recruiter" => Ok(Role::Recruiter),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

/// Free-form profile sections shown on an applicant's page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub resume: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub qualifications: Option<String>,
}

impl Profile {
    /// Overlays every field set in `patch`; unset fields keep their current value.
    pub fn merge(self, patch: Profile) -> Profile {
        Profile {
            bio: patch.bio.or(self.bio),
            skills: patch.skills.or(self.skills),
            resume: patch.resume.or(self.resume),
            experience: patch.experience.or(self.experience),
            education: patch.education.or(self.education),
            qualifications: patch.qualifications.or(self.qualifications),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub profile_picture: Option<String>,
    pub profile: Json<Profile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial update of a user's own account. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub profile: Option<Profile>,
    pub profile_picture: Option<String>,
}

pub mod file_store;
pub mod routes;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::Profile;

use crate::error::CollaboratorError;

pub use file_store::FileProfileStore;

/// A stored profile. `dob` is kept as the ISO-8601 string handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: String,
    pub name: String,
    pub dob: String,
    pub height: f64,
    pub weight: f64,
    pub gender: Option<String>,
}

impl From<Profile> for ProfileRecord {
    fn from(profile: Profile) -> Self {
        Self {
            user_id: profile.user_id,
            name: profile.name,
            dob: profile.dob.format("%Y-%m-%d").to_string(),
            height: profile.height,
            weight: profile.weight,
            gender: profile.gender,
        }
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    async fn init(&self) -> Result<(), CollaboratorError>;

    async fn save(&self, record: ProfileRecord) -> Result<(), CollaboratorError>;

    async fn get(&self, user_id: &str) -> Result<Option<ProfileRecord>, CollaboratorError>;
}

/// Wired in when no profile store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableProfileStore;

#[async_trait]
impl ProfileStore for UnavailableProfileStore {
    fn is_available(&self) -> bool {
        false
    }

    async fn init(&self) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unavailable)
    }

    async fn save(&self, _record: ProfileRecord) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unavailable)
    }

    async fn get(&self, _user_id: &str) -> Result<Option<ProfileRecord>, CollaboratorError> {
        Err(CollaboratorError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn record_carries_iso_date() {
        let profile = Profile {
            user_id: "u-7".into(),
            name: "Grace".into(),
            dob: NaiveDate::from_ymd_opt(2001, 2, 3).unwrap(),
            height: 165.5,
            weight: 58.0,
            gender: None,
        };
        let record = ProfileRecord::from(profile);
        assert_eq!(record.dob, "2001-02-03");
        assert_eq!(record.user_id, "u-7");
        assert_eq!(record.gender, None);
    }
}

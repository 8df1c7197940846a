//! Shared fixtures for the service-level integration tests

#![allow(dead_code)]

use std::sync::Arc;

use memorial_cloud::db::UserRepo;
use memorial_cloud::db::memory::MemoryStore;
use memorial_cloud::services::Services;
use shared::models::{Family, FamilyCreate, Memorial, MemorialCreate, User, UserStatus};

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let services = Services::new(store.clone());
        Self { store, services }
    }

    pub async fn user(&self, id: &str) -> String {
        self.store
            .insert_user(&User {
                id: id.to_string(),
                nickname: id.to_string(),
                avatar_url: None,
                status: UserStatus::Enabled,
                created_at: 0,
            })
            .await
            .unwrap();
        id.to_string()
    }

    pub async fn memorial(&self, creator: &str, privacy_level: i16) -> Memorial {
        self.services
            .memorials
            .create_memorial(
                creator,
                MemorialCreate {
                    deceased_name: "Zhang San".into(),
                    biography: None,
                    avatar_url: None,
                    epitaph: None,
                    birth_date: None,
                    death_date: None,
                    privacy_level: Some(privacy_level),
                },
            )
            .await
            .unwrap()
    }

    pub async fn family(&self, creator: &str) -> Family {
        self.services
            .families
            .create_family(
                creator,
                FamilyCreate {
                    name: "Zhang family".into(),
                    description: None,
                },
            )
            .await
            .unwrap()
    }

    /// Family created by `admin` with `memorial` linked and `members` joined by code
    pub async fn family_with_memorial(
        &self,
        admin: &str,
        memorial: &Memorial,
        members: &[&str],
    ) -> Family {
        let family = self.family(admin).await;
        self.services
            .families
            .add_memorial_to_family(admin, &family.id, &memorial.id)
            .await
            .unwrap();
        for member in members {
            self.services
                .families
                .join_family_by_code(member, &family.invite_code)
                .await
                .unwrap();
        }
        family
    }
}

//! Core services
//!
//! Each service is a cheap `Clone` handle over the shared store.

pub mod access;
pub mod activity;
pub mod family;
pub mod genealogy;
pub mod heritage;
pub mod memorial;
pub mod privacy;
pub mod reminder;

use std::sync::Arc;

use crate::db::Store;

pub use access::{AccessEvaluator, FamilyAccess};
pub use activity::ActivityLedger;
pub use family::FamilyGraph;
pub use genealogy::GenealogyService;
pub use heritage::HeritageService;
pub use memorial::MemorialService;
pub use privacy::PrivacyController;
pub use reminder::ReminderService;

/// All services wired over one store
#[derive(Clone)]
pub struct Services {
    pub access: AccessEvaluator,
    pub privacy: PrivacyController,
    pub families: FamilyGraph,
    pub genealogy: GenealogyService,
    pub heritage: HeritageService,
    pub reminders: ReminderService,
    pub activities: ActivityLedger,
    pub memorials: MemorialService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let access = AccessEvaluator::new(store.clone());
        let activities = ActivityLedger::new(store.clone(), access.clone());
        Self {
            privacy: PrivacyController::new(store.clone(), access.clone()),
            families: FamilyGraph::new(store.clone(), access.clone(), activities.clone()),
            genealogy: GenealogyService::new(store.clone(), access.clone(), activities.clone()),
            heritage: HeritageService::new(store.clone(), access.clone(), activities.clone()),
            reminders: ReminderService::new(store.clone(), access.clone(), activities.clone()),
            memorials: MemorialService::new(store, access.clone(), activities.clone()),
            access,
            activities,
        }
    }
}

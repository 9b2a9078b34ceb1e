use sea_orm::DatabaseConnection;

use crate::infra::db::{
    DbEventRepository, DbNotificationStore, DbTicketRepository, DbUserRepository,
};
use crate::infra::gateway::HttpPaymentGateway;
use crate::infra::notify::HttpNotifier;
use crate::infra::storage::HttpObjectStorage;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub gateway: HttpPaymentGateway,
    pub storage: HttpObjectStorage,
    pub notifier: HttpNotifier,
    pub jwt_secret: String,
    pub webhook_secret: String,
    pub check_in_base_url: String,
    pub payment_notify_url: Option<String>,
}

impl AppState {
    pub fn ticket_repo(&self) -> DbTicketRepository {
        DbTicketRepository {
            db: self.db.clone(),
        }
    }

    pub fn event_repo(&self) -> DbEventRepository {
        DbEventRepository {
            db: self.db.clone(),
        }
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn notification_store(&self) -> DbNotificationStore {
        DbNotificationStore {
            db: self.db.clone(),
        }
    }
}

use sea_orm_migration::prelude::*;

mod m20260801_000001_create_users;
mod m20260801_000002_create_events;
mod m20260801_000003_create_event_participants;
mod m20260801_000004_create_tickets;
mod m20260801_000005_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_users::Migration),
            Box::new(m20260801_000002_create_events::Migration),
            Box::new(m20260801_000003_create_event_participants::Migration),
            Box::new(m20260801_000004_create_tickets::Migration),
            Box::new(m20260801_000005_create_notifications::Migration),
        ]
    }
}

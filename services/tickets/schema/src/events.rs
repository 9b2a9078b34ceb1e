use sea_orm::entity::prelude::*;

/// Event record. `current_participants` counts reserved spots and is
/// only ever moved by the conditional registration update; the column
/// pair with `max_participants` is the capacity invariant.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub host_id: Uuid,
    /// JSON array of co-host user id strings.
    pub co_host_ids: Json,
    /// Price per spot in minor currency units.
    pub price: i64,
    pub currency: String,
    pub max_participants: i32,
    pub current_participants: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tickets::Entity")]
    Tickets,
    #[sea_orm(has_many = "super::event_participants::Entity")]
    EventParticipants,
}

impl Related<super::tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl Related<super::event_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventParticipants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

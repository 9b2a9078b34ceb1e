use sea_orm::entity::prelude::*;

/// Durable proof-of-registration record. Two uniqueness constraints
/// carry the subsystem: `ticket_number`, and the `(user_id, event_id)`
/// compound index that makes issuance idempotent.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub ticket_number: String,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub quantity: i32,
    /// Minor currency units.
    pub price: i64,
    pub payment_id: Option<String>,
    /// Inline QR artifact as a base64 PNG data URL.
    #[sea_orm(column_type = "Text")]
    pub qr_code: String,
    /// Best-effort object-storage mirror of the same artifact.
    pub qr_code_url: Option<String>,
    pub metadata: Json,
    pub check_in_time: Option<chrono::DateTime<chrono::Utc>>,
    pub checked_in_by: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::Id"
    )]
    Event,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

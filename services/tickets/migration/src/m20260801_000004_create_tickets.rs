use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Tickets::TicketNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Tickets::EventId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::UserId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::Status).string().not_null())
                    .col(
                        ColumnDef::new(Tickets::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Tickets::Price).big_integer().not_null())
                    .col(ColumnDef::new(Tickets::PaymentId).string())
                    .col(ColumnDef::new(Tickets::QrCode).text().not_null())
                    .col(ColumnDef::new(Tickets::QrCodeUrl).string())
                    .col(ColumnDef::new(Tickets::Metadata).json_binary().not_null())
                    .col(ColumnDef::new(Tickets::CheckInTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Tickets::CheckedInBy).uuid())
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tickets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Tickets::Table, Tickets::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Tickets::Table, Tickets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One ticket per (user, event) — the idempotency guarantee.
        manager
            .create_index(
                Index::create()
                    .table(Tickets::Table)
                    .col(Tickets::UserId)
                    .col(Tickets::EventId)
                    .name("idx_tickets_user_event")
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(Tickets::Table)
                    .col(Tickets::EventId)
                    .name("idx_tickets_event_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_tickets_event_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_tickets_user_event").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Tickets {
    Table,
    Id,
    TicketNumber,
    EventId,
    UserId,
    Status,
    Quantity,
    Price,
    PaymentId,
    QrCode,
    QrCodeUrl,
    Metadata,
    CheckInTime,
    CheckedInBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Events {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

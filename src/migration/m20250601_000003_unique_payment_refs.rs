use sea_orm_migration::prelude::*;

use super::m20250601_000002_create_enrollments::Enrollments;

#[derive(DeriveMigrationName)]
pub struct Migration;

// A processor payment or order settles exactly one enrollment. NULLs (rows
// created without a payment) never collide.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_enrollments_payment_id")
                    .table(Enrollments::Table)
                    .col(Enrollments::PaymentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_enrollments_payment_order_id")
                    .table(Enrollments::Table)
                    .col(Enrollments::PaymentOrderId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_enrollments_payment_order_id")
                    .table(Enrollments::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_enrollments_payment_id")
                    .table(Enrollments::Table)
                    .to_owned(),
            )
            .await
    }
}

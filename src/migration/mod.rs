use sea_orm_migration::prelude::*;

mod m20250601_000001_create_directory;
mod m20250601_000002_create_enrollments;
mod m20250601_000003_unique_payment_refs;
mod m20250601_000004_create_contacts;
mod m20250601_000005_create_verification_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_directory::Migration),
            Box::new(m20250601_000002_create_enrollments::Migration),
            Box::new(m20250601_000003_unique_payment_refs::Migration),
            Box::new(m20250601_000004_create_contacts::Migration),
            Box::new(m20250601_000005_create_verification_tokens::Migration),
        ]
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Affiliates::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Affiliates::Code).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(Affiliates::UserId).string().not_null())
          .col(
            ColumnDef::new(Affiliates::TotalConversions)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Affiliates::TotalEarnings)
              .decimal()
              .not_null()
              .default(0.0),
          )
          .col(
            ColumnDef::new(Affiliates::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Affiliates::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_affiliates_user")
          .table(Affiliates::Table)
          .col(Affiliates::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Affiliates::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Affiliates {
  Table,
  Code,
  UserId,
  TotalConversions,
  TotalEarnings,
  IsActive,
  CreatedAt,
}

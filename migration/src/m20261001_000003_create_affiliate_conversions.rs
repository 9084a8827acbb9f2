use sea_orm_migration::prelude::*;

use super::m20261001_000002_create_affiliates::Affiliates;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(AffiliateConversions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(AffiliateConversions::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(AffiliateConversions::AffiliateCode)
              .string()
              .not_null(),
          )
          .col(
            ColumnDef::new(AffiliateConversions::ConversionType)
              .string()
              .not_null(),
          )
          .col(
            ColumnDef::new(AffiliateConversions::ConversionValue)
              .decimal()
              .not_null(),
          )
          .col(
            ColumnDef::new(AffiliateConversions::CommissionRate)
              .decimal()
              .not_null(),
          )
          .col(
            ColumnDef::new(AffiliateConversions::CommissionAmount)
              .decimal()
              .not_null(),
          )
          .col(
            ColumnDef::new(AffiliateConversions::ReferenceId).string().null(),
          )
          .col(
            ColumnDef::new(AffiliateConversions::CreatedAt)
              .date_time()
              .not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_affiliate_conversions_affiliate")
              .from(
                AffiliateConversions::Table,
                AffiliateConversions::AffiliateCode,
              )
              .to(Affiliates::Table, Affiliates::Code)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_affiliate_conversions_affiliate")
          .table(AffiliateConversions::Table)
          .col(AffiliateConversions::AffiliateCode)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(AffiliateConversions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum AffiliateConversions {
  Table,
  Id,
  AffiliateCode,
  ConversionType,
  ConversionValue,
  CommissionRate,
  CommissionAmount,
  ReferenceId,
  CreatedAt,
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Promotions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Promotions::Id).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(Promotions::Name).string().not_null())
          .col(ColumnDef::new(Promotions::Code).string().null())
          .col(
            ColumnDef::new(Promotions::DiscountType)
              .string()
              .not_null()
              .default("none"),
          )
          .col(
            ColumnDef::new(Promotions::DiscountValue)
              .decimal()
              .not_null()
              .default(0.0),
          )
          .col(ColumnDef::new(Promotions::MaxDiscountAmount).decimal().null())
          .col(ColumnDef::new(Promotions::MinPurchaseAmount).decimal().null())
          .col(ColumnDef::new(Promotions::MaxUses).integer().null())
          .col(
            ColumnDef::new(Promotions::CurrentUses)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Promotions::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Promotions::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_promotions_code")
          .table(Promotions::Table)
          .col(Promotions::Code)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_index(
        Index::drop()
          .name("idx_promotions_code")
          .table(Promotions::Table)
          .to_owned(),
      )
      .await?;

    manager.drop_table(Table::drop().table(Promotions::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Promotions {
  Table,
  Id,
  Name,
  Code,
  DiscountType,
  DiscountValue,
  MaxDiscountAmount,
  MinPurchaseAmount,
  MaxUses,
  CurrentUses,
  IsActive,
  CreatedAt,
}

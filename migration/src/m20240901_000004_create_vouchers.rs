use sea_orm_migration::prelude::*;

use super::m20240901_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Vouchers::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Vouchers::VoucherId)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Vouchers::Name).string().not_null())
          .col(
            ColumnDef::new(Vouchers::VoucherType)
              .string()
              .not_null()
              .default("oferta"),
          )
          .col(ColumnDef::new(Vouchers::ImageUrl).string().null())
          .col(ColumnDef::new(Vouchers::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(UserVouchers::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(UserVouchers::UserVoucherId)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(UserVouchers::VoucherId).integer().not_null())
          .col(ColumnDef::new(UserVouchers::AssignedTo).integer().not_null())
          .col(ColumnDef::new(UserVouchers::AssignedBy).integer().not_null())
          .col(ColumnDef::new(UserVouchers::Reason).string().null())
          .col(
            ColumnDef::new(UserVouchers::CreditLimit)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserVouchers::CreditBalance)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserVouchers::IsActive)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(UserVouchers::AssignedAt).date_time().not_null())
          .col(ColumnDef::new(UserVouchers::ActivatedBy).integer().null())
          .col(ColumnDef::new(UserVouchers::ActivatedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_vouchers_voucher")
              .from(UserVouchers::Table, UserVouchers::VoucherId)
              .to(Vouchers::Table, Vouchers::VoucherId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_vouchers_user")
              .from(UserVouchers::Table, UserVouchers::AssignedTo)
              .to(Users::Table, Users::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(VoucherTransactions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(VoucherTransactions::TransactionId)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(VoucherTransactions::UserVoucherId)
              .integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(VoucherTransactions::CreditsBefore)
              .integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(VoucherTransactions::CreditsAfter)
              .integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(VoucherTransactions::ChangedBy).integer().not_null(),
          )
          .col(ColumnDef::new(VoucherTransactions::Observation).string().null())
          .col(
            ColumnDef::new(VoucherTransactions::CreatedAt)
              .date_time()
              .not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_voucher_transactions_user_voucher")
              .from(
                VoucherTransactions::Table,
                VoucherTransactions::UserVoucherId,
              )
              .to(UserVouchers::Table, UserVouchers::UserVoucherId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(VoucherTransactions::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(UserVouchers::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(Vouchers::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Vouchers {
  Table,
  VoucherId,
  Name,
  VoucherType,
  ImageUrl,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum UserVouchers {
  Table,
  UserVoucherId,
  VoucherId,
  AssignedTo,
  AssignedBy,
  Reason,
  CreditLimit,
  CreditBalance,
  IsActive,
  AssignedAt,
  ActivatedBy,
  ActivatedAt,
}

#[derive(DeriveIden)]
pub enum VoucherTransactions {
  Table,
  TransactionId,
  UserVoucherId,
  CreditsBefore,
  CreditsAfter,
  ChangedBy,
  Observation,
  CreatedAt,
}

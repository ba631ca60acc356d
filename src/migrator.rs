use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240901_000001_create_venue_tables::Migration),
            Box::new(m20240901_000002_create_people_tables::Migration),
            Box::new(m20240901_000003_create_catalog_tables::Migration),
            Box::new(m20240901_000004_create_commerce_tables::Migration),
            Box::new(m20240901_000005_create_delivery_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240901_000001_create_venue_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000001_create_venue_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Theatres::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Theatres::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Theatres::Name).string().not_null())
                        .col(ColumnDef::new(Theatres::Address).string().not_null())
                        .col(
                            ColumnDef::new(Theatres::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Auditoriums::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Auditoriums::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Auditoriums::TheatreId).uuid().not_null())
                        .col(ColumnDef::new(Auditoriums::Number).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Seats::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Seats::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Seats::AuditoriumId).uuid().not_null())
                        .col(ColumnDef::new(Seats::Aisle).string().not_null())
                        .col(ColumnDef::new(Seats::Number).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Movies::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Movies::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Movies::Title).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MovieShowings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MovieShowings::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovieShowings::MovieId).uuid().not_null())
                        .col(ColumnDef::new(MovieShowings::AuditoriumId).uuid().not_null())
                        .col(
                            ColumnDef::new(MovieShowings::StartTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MovieShowings::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Movies::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Seats::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Auditoriums::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Theatres::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Theatres {
        Table,
        Id,
        Name,
        Address,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Auditoriums {
        Table,
        Id,
        TheatreId,
        Number,
    }

    #[derive(DeriveIden)]
    enum Seats {
        Table,
        Id,
        AuditoriumId,
        Aisle,
        Number,
    }

    #[derive(DeriveIden)]
    enum Movies {
        Table,
        Id,
        Title,
    }

    #[derive(DeriveIden)]
    enum MovieShowings {
        Table,
        Id,
        MovieId,
        AuditoriumId,
        StartTime,
    }
}

mod m20240901_000002_create_people_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000002_create_people_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Customers::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Customers::UserId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string().not_null())
                        .col(ColumnDef::new(Customers::DefaultTheatreId).uuid().null())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Staff::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Staff::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Staff::UserId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Staff::Name).string().not_null())
                        .col(ColumnDef::new(Staff::TheatreId).uuid().not_null())
                        .col(ColumnDef::new(Staff::Role).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Staff::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_staff_theatre_id")
                        .table(Staff::Table)
                        .col(Staff::TheatreId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Drivers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Drivers::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Drivers::UserId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Drivers::Name).string().not_null())
                        .col(
                            ColumnDef::new(Drivers::Rating)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Drivers::RatingCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Drivers::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Drivers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Drivers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Staff::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
        UserId,
        Name,
        Email,
        DefaultTheatreId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Staff {
        Table,
        Id,
        UserId,
        Name,
        TheatreId,
        Role,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Drivers {
        Table,
        Id,
        UserId,
        Name,
        Rating,
        RatingCount,
        Status,
        CreatedAt,
    }
}

mod m20240901_000003_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000003_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(
                            ColumnDef::new(Products::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::Discount)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::InventoryQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::IsAvailable)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Bundles::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Bundles::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Bundles::Name).string().not_null())
                        .col(ColumnDef::new(Bundles::Description).text().null())
                        .col(
                            ColumnDef::new(Bundles::OriginalPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bundles::TotalPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bundles::IsAvailable)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Bundles::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(Bundles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bundles::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BundleItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BundleItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BundleItems::BundleId).uuid().not_null())
                        .col(ColumnDef::new(BundleItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(BundleItems::Quantity).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bundle_items_bundle_id")
                                .from(BundleItems::Table, BundleItems::BundleId)
                                .to(Bundles::Table, Bundles::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bundle_items_bundle_id")
                        .table(BundleItems::Table)
                        .col(BundleItems::BundleId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BundleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Bundles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        Description,
        UnitPrice,
        Discount,
        InventoryQuantity,
        IsAvailable,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Bundles {
        Table,
        Id,
        Name,
        Description,
        OriginalPrice,
        TotalPrice,
        IsAvailable,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum BundleItems {
        Table,
        Id,
        BundleId,
        ProductId,
        Quantity,
    }
}

mod m20240901_000004_create_commerce_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000004_create_commerce_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CustomerShowings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerShowings::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerShowings::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(CustomerShowings::MovieShowingId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerShowings::SeatId).uuid().not_null())
                        .col(
                            ColumnDef::new(CustomerShowings::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CartItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(CartItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(CartItems::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::ProductId).uuid().null())
                        .col(ColumnDef::new(CartItems::BundleId).uuid().null())
                        .col(ColumnDef::new(CartItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(CartItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cart_items_customer_id")
                        .table(CartItems::Table)
                        .col(CartItems::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PaymentMethods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentMethods::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentMethods::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(PaymentMethods::CardNumber).string().not_null())
                        .col(
                            ColumnDef::new(PaymentMethods::ExpirationMonth)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentMethods::ExpirationYear)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentMethods::BillingAddress)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentMethods::Balance)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PaymentMethods::IsDefault)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PaymentMethods::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Coupons::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Coupons::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Coupons::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Coupons::DiscountPercent)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::Difficulty)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Coupons::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Coupons::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CodePuzzles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CodePuzzles::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CodePuzzles::Difficulty).integer().not_null())
                        .col(ColumnDef::new(CodePuzzles::Script).text().not_null())
                        .col(ColumnDef::new(CodePuzzles::Answer).string().not_null())
                        .col(
                            ColumnDef::new(CodePuzzles::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(CodePuzzles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CodePuzzles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Coupons::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PaymentMethods::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CartItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CustomerShowings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum CustomerShowings {
        Table,
        Id,
        CustomerId,
        MovieShowingId,
        SeatId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        CustomerId,
        ProductId,
        BundleId,
        Quantity,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PaymentMethods {
        Table,
        Id,
        CustomerId,
        CardNumber,
        ExpirationMonth,
        ExpirationYear,
        BillingAddress,
        Balance,
        IsDefault,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Coupons {
        Table,
        Id,
        Code,
        DiscountPercent,
        Difficulty,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum CodePuzzles {
        Table,
        Id,
        Difficulty,
        Script,
        Answer,
        IsActive,
        CreatedAt,
    }
}

mod m20240901_000005_create_delivery_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000005_create_delivery_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Deliveries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Deliveries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::CustomerShowingId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Deliveries::PaymentMethodId).uuid().not_null())
                        .col(ColumnDef::new(Deliveries::DriverId).uuid().null())
                        .col(ColumnDef::new(Deliveries::StaffId).uuid().null())
                        .col(
                            ColumnDef::new(Deliveries::TotalPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::DiscountAmount)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Deliveries::CouponId).uuid().null())
                        .col(ColumnDef::new(Deliveries::CouponCode).string().null())
                        .col(ColumnDef::new(Deliveries::NgoId).integer().null())
                        .col(ColumnDef::new(Deliveries::NgoName).string().null())
                        .col(
                            ColumnDef::new(Deliveries::DonationAmount)
                                .decimal_len(16, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::DonationPercentage)
                                .decimal_len(16, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::PaymentStatus)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::DeliveryStatus)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::DeliveryTime)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_deliveries_customer_showing_id")
                        .table(Deliveries::Table)
                        .col(Deliveries::CustomerShowingId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryItems::DeliveryId).uuid().not_null())
                        .col(ColumnDef::new(DeliveryItems::CartItemId).uuid().not_null())
                        .col(ColumnDef::new(DeliveryItems::ProductId).uuid().null())
                        .col(ColumnDef::new(DeliveryItems::BundleId).uuid().null())
                        .col(ColumnDef::new(DeliveryItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(DeliveryItems::LineTotal)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_delivery_items_delivery_id")
                                .from(DeliveryItems::Table, DeliveryItems::DeliveryId)
                                .to(Deliveries::Table, Deliveries::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_delivery_items_cart_item_unique")
                        .table(DeliveryItems::Table)
                        .col(DeliveryItems::CartItemId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(NgoDonations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(NgoDonations::NgoId)
                                .integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NgoDonations::TotalAmountDonated)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(NgoDonations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(NgoDonations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DeliveryItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Deliveries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Deliveries {
        Table,
        Id,
        CustomerShowingId,
        PaymentMethodId,
        DriverId,
        StaffId,
        TotalPrice,
        DiscountAmount,
        CouponId,
        CouponCode,
        NgoId,
        NgoName,
        DonationAmount,
        DonationPercentage,
        PaymentStatus,
        DeliveryStatus,
        DeliveryTime,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryItems {
        Table,
        Id,
        DeliveryId,
        CartItemId,
        ProductId,
        BundleId,
        Quantity,
        LineTotal,
    }

    #[derive(DeriveIden)]
    enum NgoDonations {
        Table,
        NgoId,
        TotalAmountDonated,
        UpdatedAt,
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::FirstName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Users::LastName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Users::PhoneNumber)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Users::Role).text().not_null())
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::Bio).text().not_null().default(""))
                    .col(ColumnDef::new(Users::ProfilePicture).string())
                    .col(
                        ColumnDef::new(Users::DateJoined)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Users::LastLogin).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create class_categories table
        manager
            .create_table(
                Table::create()
                    .table(ClassCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClassCategories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClassCategories::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ClassCategories::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ClassCategories::Icon)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ClassCategories::Color)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ClassCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ClassCategories::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ClassCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassCategories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create classes table
        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Classes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Classes::Name).string().not_null())
                    .col(ColumnDef::new(Classes::Description).text().not_null())
                    .col(ColumnDef::new(Classes::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Classes::InstructorId).uuid().not_null())
                    .col(ColumnDef::new(Classes::DurationMinutes).integer().not_null())
                    .col(ColumnDef::new(Classes::Difficulty).text().not_null())
                    .col(ColumnDef::new(Classes::MaxCapacity).integer().not_null())
                    .col(ColumnDef::new(Classes::LocationType).text().not_null())
                    .col(
                        ColumnDef::new(Classes::LocationName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Classes::LocationAddress)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Classes::Requirements)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Classes::PriceCents).big_integer())
                    .col(
                        ColumnDef::new(Classes::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(
                        ColumnDef::new(Classes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Classes::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Classes::ImageUrl).string())
                    .col(
                        ColumnDef::new(Classes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Classes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-classes-category_id")
                            .from(Classes::Table, Classes::CategoryId)
                            .to(ClassCategories::Table, ClassCategories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-classes-instructor_id")
                            .from(Classes::Table, Classes::InstructorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create class_schedules table
        manager
            .create_table(
                Table::create()
                    .table(ClassSchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClassSchedules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClassSchedules::ClassId).uuid().not_null())
                    .col(
                        ColumnDef::new(ClassSchedules::InstructorId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassSchedules::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassSchedules::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassSchedules::MaxCapacity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassSchedules::BookedSlots)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ClassSchedules::WaitlistEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ClassSchedules::Recurrence)
                            .text()
                            .not_null()
                            .default("none"),
                    )
                    .col(ColumnDef::new(ClassSchedules::RecurrenceEndDate).date())
                    .col(ColumnDef::new(ClassSchedules::ParentScheduleId).uuid())
                    .col(ColumnDef::new(ClassSchedules::Status).text().not_null())
                    .col(
                        ColumnDef::new(ClassSchedules::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ClassSchedules::CancellationReason)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ClassSchedules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassSchedules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-class_schedules-class_id")
                            .from(ClassSchedules::Table, ClassSchedules::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-class_schedules-instructor_id")
                            .from(ClassSchedules::Table, ClassSchedules::InstructorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-class_schedules-parent_schedule_id")
                            .from(ClassSchedules::Table, ClassSchedules::ParentScheduleId)
                            .to(ClassSchedules::Table, ClassSchedules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create bookings table
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bookings::UserId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::ScheduleId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::Status).text().not_null())
                    .col(
                        ColumnDef::new(Bookings::BookingTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::CancellationTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Bookings::IsWaitlisted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Bookings::WaitlistPosition).integer())
                    .col(
                        ColumnDef::new(Bookings::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-user_id")
                            .from(Bookings::Table, Bookings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-schedule_id")
                            .from(Bookings::Table, Bookings::ScheduleId)
                            .to(ClassSchedules::Table, ClassSchedules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One booking per user per session
        manager
            .create_index(
                Index::create()
                    .name("uq_bookings_user_id_schedule_id")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .col(Bookings::ScheduleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create class_reviews table
        manager
            .create_table(
                Table::create()
                    .table(ClassReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClassReviews::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClassReviews::UserId).uuid().not_null())
                    .col(ColumnDef::new(ClassReviews::ScheduleId).uuid().not_null())
                    .col(ColumnDef::new(ClassReviews::ClassId).uuid().not_null())
                    .col(ColumnDef::new(ClassReviews::Rating).small_integer().not_null())
                    .col(
                        ColumnDef::new(ClassReviews::Review)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ClassReviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassReviews::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-class_reviews-user_id")
                            .from(ClassReviews::Table, ClassReviews::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-class_reviews-schedule_id")
                            .from(ClassReviews::Table, ClassReviews::ScheduleId)
                            .to(ClassSchedules::Table, ClassSchedules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-class_reviews-class_id")
                            .from(ClassReviews::Table, ClassReviews::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One review per user per session
        manager
            .create_index(
                Index::create()
                    .name("uq_class_reviews_user_id_schedule_id")
                    .table(ClassReviews::Table)
                    .col(ClassReviews::UserId)
                    .col(ClassReviews::ScheduleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClassReviews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClassSchedules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClassCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    PhoneNumber,
    Role,
    IsActive,
    IsVerified,
    Bio,
    ProfilePicture,
    DateJoined,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum ClassCategories {
    Table,
    Id,
    Name,
    Description,
    Icon,
    Color,
    IsActive,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Classes {
    Table,
    Id,
    Name,
    Description,
    CategoryId,
    InstructorId,
    DurationMinutes,
    Difficulty,
    MaxCapacity,
    LocationType,
    LocationName,
    LocationAddress,
    Requirements,
    PriceCents,
    Currency,
    IsActive,
    IsFeatured,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum ClassSchedules {
    Table,
    Id,
    ClassId,
    InstructorId,
    StartTime,
    EndTime,
    MaxCapacity,
    BookedSlots,
    WaitlistEnabled,
    Recurrence,
    RecurrenceEndDate,
    ParentScheduleId,
    Status,
    Notes,
    CancellationReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Bookings {
    Table,
    Id,
    UserId,
    ScheduleId,
    Status,
    BookingTime,
    CancellationTime,
    IsWaitlisted,
    WaitlistPosition,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum ClassReviews {
    Table,
    Id,
    UserId,
    ScheduleId,
    ClassId,
    Rating,
    Review,
    CreatedAt,
    UpdatedAt,
}

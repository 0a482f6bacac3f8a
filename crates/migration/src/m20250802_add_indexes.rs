use sea_orm_migration::prelude::*;

use crate::m20250801_create_all_tables::{
    Bookings, ClassReviews, ClassSchedules, Classes, Users,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Indexes on users for auth and admin filtering
        manager
            .create_index(
                Index::create()
                    .name("idx_users_role")
                    .table(Users::Table)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_is_active")
                    .table(Users::Table)
                    .col(Users::IsActive)
                    .to_owned(),
            )
            .await?;

        // Indexes on classes for catalog filtering
        manager
            .create_index(
                Index::create()
                    .name("idx_classes_category_id")
                    .table(Classes::Table)
                    .col(Classes::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_classes_instructor_id")
                    .table(Classes::Table)
                    .col(Classes::InstructorId)
                    .to_owned(),
            )
            .await?;

        // Indexes on class_schedules for calendar and availability lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_class_schedules_class_id")
                    .table(ClassSchedules::Table)
                    .col(ClassSchedules::ClassId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_class_schedules_instructor_id")
                    .table(ClassSchedules::Table)
                    .col(ClassSchedules::InstructorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_class_schedules_start_time_status")
                    .table(ClassSchedules::Table)
                    .col(ClassSchedules::StartTime)
                    .col(ClassSchedules::Status)
                    .to_owned(),
            )
            .await?;

        // Indexes on bookings for the my-bookings and capacity paths
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_user_id")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_schedule_id")
                    .table(Bookings::Table)
                    .col(Bookings::ScheduleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_status")
                    .table(Bookings::Table)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await?;

        // Indexes on class_reviews for aggregate queries
        manager
            .create_index(
                Index::create()
                    .name("idx_class_reviews_class_id")
                    .table(ClassReviews::Table)
                    .col(ClassReviews::ClassId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_class_reviews_rating")
                    .table(ClassReviews::Table)
                    .col(ClassReviews::Rating)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_users_role",
            "idx_users_is_active",
            "idx_classes_category_id",
            "idx_classes_instructor_id",
            "idx_class_schedules_class_id",
            "idx_class_schedules_instructor_id",
            "idx_class_schedules_start_time_status",
            "idx_bookings_user_id",
            "idx_bookings_schedule_id",
            "idx_bookings_status",
            "idx_class_reviews_class_id",
            "idx_class_reviews_rating",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}

use models::{capacity, schedule_status::ScheduleStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub class_id: Uuid,
    pub instructor_id: Uuid,
    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,
    pub max_capacity: i32,
    pub booked_slots: i32,
    pub waitlist_enabled: bool,
    pub recurrence: String, // none, daily, weekly, monthly
    pub recurrence_end_date: Option<Date>,
    pub parent_schedule_id: Option<Uuid>,
    pub status: ScheduleStatus,
    pub notes: String,
    pub cancellation_reason: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn available_slots(&self) -> i32 {
        capacity::available_slots(self.max_capacity, self.booked_slots)
    }

    pub fn is_full(&self) -> bool {
        capacity::is_full(self.max_capacity, self.booked_slots)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::InstructorId",
        to = "super::user::Column::Id"
    )]
    Instructor,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentScheduleId",
        to = "Column::Id"
    )]
    ParentSchedule,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

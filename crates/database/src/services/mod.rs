use sea_orm::DbErr;
use thiserror::Error;

pub mod analytics;
pub mod booking;
pub mod catalog;
pub mod review;
pub mod schedule;
pub mod user;

pub use analytics::AnalyticsService;
pub use booking::BookingService;
pub use catalog::CatalogService;
pub use review::ReviewService;
pub use schedule::ScheduleService;
pub use user::UserService;

/// Business-rule and lookup failures raised by the service layer.
///
/// Everything except `Database` is a client-visible outcome; the API layer
/// owns the mapping to HTTP statuses.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("user not found")]
    UserNotFound,
    #[error("category not found")]
    CategoryNotFound,
    #[error("class not found")]
    ClassNotFound,
    #[error("class schedule not found")]
    ScheduleNotFound,
    #[error("booking not found")]
    BookingNotFound,

    #[error("email is already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is disabled")]
    AccountDisabled,
    #[error("instructor role required")]
    NotAnInstructor,

    #[error("this class session is not available for booking")]
    ScheduleNotBookable,
    #[error("cannot book past class sessions")]
    SessionInPast,
    #[error("you already have a booking for this class session")]
    DuplicateBooking,
    #[error("this class session is full and waitlist is not enabled")]
    SessionFull,
    #[error("booking is already cancelled")]
    AlreadyCancelled,
    #[error("cannot modify a completed booking")]
    BookingCompleted,
    #[error("bookings must be cancelled at least {0} hours before the class starts")]
    CancellationWindowPassed(i64),

    #[error("you can only review classes you have attended")]
    ReviewNotEligible,
    #[error("you have already reviewed this class session")]
    DuplicateReview,

    #[error("{0}")]
    Invalid(String),
}

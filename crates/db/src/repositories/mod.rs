//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Multi-statement workflows open
//! their own transaction.

pub mod delivery_confirmation_repo;
pub mod order_alert_repo;
pub mod order_delivery_confirmation_repo;
pub mod order_repo;
pub mod order_status_change_repo;
pub mod password_reset_repo;
pub mod patient_repo;
pub mod photo_prompt_schedule_repo;
pub mod photo_request_repo;
pub mod user_repo;
pub mod wound_photo_repo;

pub use delivery_confirmation_repo::DeliveryConfirmationRepo;
pub use order_alert_repo::OrderAlertRepo;
pub use order_delivery_confirmation_repo::OrderDeliveryConfirmationRepo;
pub use order_repo::OrderRepo;
pub use order_status_change_repo::OrderStatusChangeRepo;
pub use password_reset_repo::PasswordResetRepo;
pub use patient_repo::PatientRepo;
pub use photo_prompt_schedule_repo::PhotoPromptScheduleRepo;
pub use photo_request_repo::PhotoRequestRepo;
pub use user_repo::UserRepo;
pub use wound_photo_repo::WoundPhotoRepo;

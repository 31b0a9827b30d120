pub mod appointment;
pub mod price;
pub mod time_range_settings;
pub mod user;

pub use appointment::{AppointmentRepository, CreateAppointment, UpdateAppointment};
pub use price::PriceRepository;
pub use time_range_settings::TimeRangeSettingsRepository;
pub use user::{CreateUser, UserRepository};

pub mod appointments;
pub mod booking;
pub mod catalog;
pub mod slots;

pub use appointments::AppointmentStore;
pub use booking::BookingService;
pub use catalog::CatalogService;
pub use slots::SlotService;

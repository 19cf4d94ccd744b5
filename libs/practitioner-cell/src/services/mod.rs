pub mod practitioner;
pub mod schedule;

pub use practitioner::PractitionerService;
pub use schedule::ScheduleService;

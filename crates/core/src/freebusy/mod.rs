mod error;
mod service;
mod traits;
mod types;

pub use error::{FreeBusyError, ProviderError};
pub use service::{FreeBusyService, DEFAULT_FREE_BUSY_TTL};
pub use traits::CalendarProvider;
pub use types::{composite_calendar_id, BusyInterval, FreeBusySchedule, RawBusyInterval};

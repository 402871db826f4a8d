mod property;
mod reservation;
mod stay_time;

pub use property::PropertySummary;
pub(crate) use reservation::BOOKING_LIST;
pub use reservation::{Reservation, ReservationError, ReservationStatus};
pub use stay_time::StayTime;

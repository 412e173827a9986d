//! Data types shared by the feed, the session and the dashboard.

pub mod bed;
pub mod location;
pub mod patient;
pub mod therapy;
pub mod vitals;

pub use bed::{BedRow, BedStatus, OccupancyBand};
pub use location::{CareUnit, LocationEvent, LocationRecord, LocationStatus};
pub use patient::{BloodType, PatientRecord, Sex};
pub use therapy::{Route, TherapyOrder, TherapyRequest};
pub use vitals::{VitalParameter, VitalReading, Worsening, TIMESTAMP_FORMAT};

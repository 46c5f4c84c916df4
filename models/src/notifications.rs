// models/src/notifications.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who a side-channel message is addressed to. Resolution of the concrete
/// recipient (which doctor, which admin) is the delivery layer's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationTarget {
    Doctor,
    Patient,
    HospitalAdmin,
}

impl fmt::Display for NotificationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationTarget::Doctor => "doctor",
            NotificationTarget::Patient => "patient",
            NotificationTarget::HospitalAdmin => "hospital_admin",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationSeverity {
    Info,
    Warning,
    Critical,
}

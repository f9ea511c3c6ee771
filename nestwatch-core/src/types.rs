//! Shared types and error enum for nestwatch-core.

use serde::Deserialize;
use thiserror::Error;

/// All errors produced by nestwatch-core.
#[derive(Debug, Error)]
pub enum NestError {
    #[error("malformed feed document: {0}")]
    FeedDecode(String),
    #[error("invalid capture timestamp: {0}")]
    Timestamp(String),
    #[error("invalid coordinate: {0}")]
    Coordinate(String),
}

pub type Result<T> = std::result::Result<T, NestError>;

/// A position in feed coordinate units (millimetres).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One drone sighting from a feed capture.
///
/// Ephemeral — produced fresh each poll cycle, never stored directly.
/// All observations from one capture share `observed_at`.
#[derive(Debug, Clone)]
pub struct DroneObservation {
    pub serial: String,
    pub position: Point,
    /// Capture timestamp, epoch milliseconds.
    pub observed_at: i64,
}

/// Registered pilot identity as returned by the remote lookup service.
///
/// Immutable once fetched — a drone is never re-resolved to a different
/// pilot within a process lifetime.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PilotIdentity {
    pub pilot_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl PilotIdentity {
    /// Display name, `"<firstName> <lastName>"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(b), 5.0);
        assert_eq!(b.distance_to(a), 5.0);
    }

    #[test]
    fn test_pilot_identity_deserialize() {
        let json = r#"{
            "pilotId": "P1",
            "firstName": "Ann",
            "lastName": "Lee",
            "email": "a@x.com",
            "phoneNumber": "555",
            "createdDt": "2023-01-09T00:00:00Z"
        }"#;
        let pilot: PilotIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(pilot.pilot_id, "P1");
        assert_eq!(pilot.full_name(), "Ann Lee");
    }
}

//! Pure functions for serializing free/busy schedules to/from cache bytes.
//!
//! JSON is used for cache values so they stay human-readable when
//! inspecting the cache directly.

use thiserror::Error;

use crate::freebusy::FreeBusySchedule;

/// Errors that can occur during cache serialization/deserialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

/// Serializes a free/busy schedule to JSON bytes.
pub fn serialize_schedule(
    schedule: &FreeBusySchedule,
) -> std::result::Result<Vec<u8>, SerializationError> {
    serde_json::to_vec(schedule).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes JSON bytes to a free/busy schedule.
pub fn deserialize_schedule(
    bytes: &[u8],
) -> std::result::Result<FreeBusySchedule, SerializationError> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freebusy::BusyInterval;

    #[test]
    fn test_round_trip() {
        let mut schedule = FreeBusySchedule::new();
        schedule.insert(
            "google#a@b.c/primary".to_string(),
            vec![BusyInterval {
                start: "2024-01-01T09:00:00Z".to_string(),
                end: "2024-01-01T10:00:00Z".to_string(),
            }],
        );

        let bytes = serialize_schedule(&schedule).unwrap();
        let back = deserialize_schedule(&bytes).unwrap();
        assert_eq!(back, schedule);
    }

    #[test]
    fn test_garbage_bytes_fail_to_deserialize() {
        assert!(matches!(
            deserialize_schedule(b"not json"),
            Err(SerializationError::DeserializeFailed(_))
        ));
    }
}

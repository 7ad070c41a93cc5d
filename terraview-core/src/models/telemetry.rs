use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::TerrariumId;

/// A tracked sensor unit, owned by the upstream system.
///
/// The relay never mutates terrariums; it only uses them to know which
/// readings to poll for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrarium {
    pub id: TerrariumId,
    pub name: String,
}

/// A timestamped temperature/humidity sample for one terrarium.
///
/// Produced by the upstream system and forwarded to viewers verbatim
/// (field names match the upstream JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub terrarium_id: TerrariumId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_matches_upstream_shape() {
        let json = r#"{
            "id": 17,
            "date": "2026-03-01T12:00:00Z",
            "temperature": 26.5,
            "humidity": 71.0,
            "terrarium_id": 3
        }"#;

        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.id, 17);
        assert_eq!(reading.terrarium_id, TerrariumId(3));
        assert!((reading.temperature - 26.5).abs() < f64::EPSILON);

        // Forwarded payloads keep the upstream field names
        let value = serde_json::to_value(&reading).unwrap();
        assert!(value.get("terrarium_id").is_some());
        assert!(value.get("date").is_some());
    }

    #[test]
    fn test_terrarium_deserializes() {
        let terrarium: Terrarium = serde_json::from_str(r#"{"id": 1, "name": "Gecko"}"#).unwrap();
        assert_eq!(terrarium.id, TerrariumId(1));
        assert_eq!(terrarium.name, "Gecko");
    }
}

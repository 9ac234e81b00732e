//! Search API wire types.

use serde::{Deserialize, Serialize};

/// One emote record from the shared-emote search endpoint.
///
/// Responses carry more fields (`imageType`, `animated`, `user`, ...);
/// everything beyond the code and the id is ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmoteRecord {
    /// Display name; not unique across records
    pub code: String,
    /// Opaque unique identifier
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_extra_fields() {
        let json = r#"{
            "id": "5f1b0186cf6d2144653d2970",
            "code": "catJAM",
            "imageType": "gif",
            "animated": true,
            "user": {"id": "5561169bd6b9d206222a8c19", "name": "zulul"}
        }"#;

        let record: EmoteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.code, "catJAM");
        assert_eq!(record.id, "5f1b0186cf6d2144653d2970");
    }

    #[test]
    fn test_decode_page() {
        let json = r#"[
            {"id": "a1", "code": "Kappa"},
            {"id": "a2", "code": "Kappa"}
        ]"#;

        let records: Vec<EmoteRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, records[1].code);
    }
}

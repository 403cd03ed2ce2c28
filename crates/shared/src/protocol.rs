use serde::{Deserialize, Serialize};

use crate::domain::FaceRecord;

/// Generic response envelope for state-changing backend calls.
///
/// The canonical backend speaks `{"success": bool, "message": ...}`. The
/// older backend variant speaks `{"status": "success"|"error", ...}`
/// instead; both are accepted so the client works against either server
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// Server message, or a caller-supplied fallback when the server sent
    /// none. Failure messages must reach the user verbatim.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(fallback)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RawEnvelope {
    fn outcome(&self) -> Option<bool> {
        match (self.success, self.status.as_deref()) {
            (Some(ok), _) => Some(ok),
            (None, Some(status)) => Some(status.eq_ignore_ascii_case("success")),
            (None, None) => None,
        }
    }
}

impl<'de> Deserialize<'de> for Ack {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawEnvelope::deserialize(deserializer)?;
        let success = raw
            .outcome()
            .ok_or_else(|| serde::de::Error::missing_field("success"))?;
        Ok(Self {
            success,
            message: raw.message,
        })
    }
}

/// Response to `POST /toggle_recognition`: the envelope plus the flag the
/// server actually ended up with. The client mirrors `enabled` as-is
/// rather than flipping its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecognitionToggled {
    #[serde(flatten)]
    pub ack: Ack,
    #[serde(default)]
    pub enabled: bool,
}

/// Response to `GET /get_registered_faces`. The older backend variant
/// omits the envelope entirely on this endpoint, so a missing outcome
/// field counts as success here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceListing {
    pub success: bool,
    pub message: Option<String>,
    pub faces: Vec<FaceRecord>,
}

impl<'de> Deserialize<'de> for FaceListing {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawListing {
            #[serde(flatten)]
            envelope: RawEnvelope,
            #[serde(default)]
            faces: Vec<FaceRecord>,
        }

        let raw = RawListing::deserialize(deserializer)?;
        Ok(Self {
            success: raw.envelope.outcome().unwrap_or(true),
            message: raw.envelope.message,
            faces: raw.faces,
        })
    }
}

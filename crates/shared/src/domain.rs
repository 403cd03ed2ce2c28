use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(FaceId);

/// A registered face as the backend reports it. Remote-owned: the client
/// never edits one of these locally, it only re-fetches the full listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRecord {
    pub id: FaceId,
    pub name: String,
    /// Server-relative path to the reference image, e.g. `/face_image/3`.
    pub image_path: String,
}

/// Where the image bytes in a pending registration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Capture,
    Upload,
}

impl ImageSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Capture => "camera capture",
            Self::Upload => "uploaded file",
        }
    }
}

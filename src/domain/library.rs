use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub library_uid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
}

impl Library {
    /// Placeholder used when the library backend could not be reached for
    /// an enrichment fetch. Only the UID is populated.
    pub fn placeholder(library_uid: Uuid) -> Self {
        Self {
            library_uid,
            name: String::new(),
            city: String::new(),
            address: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrariesPage {
    pub page: u32,
    pub page_size: u32,
    pub total_elements: u32,
    pub items: Vec<Library>,
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::game::Game;
use super::sub::DtoPrices;

// ---------------------------------------------------------------------------
// SetSummary: one entry of an external set listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSummary {
    pub code: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// CardDto: uniform card record returned by every external adapter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    /// Identifier assigned by the external API.
    pub id: String,
    pub name: String,
    pub game: Game,
    pub set: String,
    pub set_name: String,
    pub number: String,
    pub rarity: String,
    pub image_url: Option<String>,
    pub artist: Option<String>,
    pub is_foil: bool,
    pub prices: DtoPrices,
    #[serde(rename = "type")]
    pub type_field: Option<String>,
    pub text: Option<String>,
    /// The API record mapped into factory field names.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

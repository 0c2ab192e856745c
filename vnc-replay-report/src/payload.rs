//! The fixed JSON payload shapes pushed to the embedded player, one per
//! event kind (SPEC_FULL.md §4.6). Field names are capitalized to match the
//! shapes the player script expects.

use serde::Serialize;

#[derive(Serialize)]
pub struct KeyPayload {
    #[serde(rename = "Key")]
    pub key: u32,
}

#[derive(Serialize)]
pub struct PointerPayload {
    #[serde(rename = "X")]
    pub x: u16,
    #[serde(rename = "Y")]
    pub y: u16,
    #[serde(rename = "Lmb")]
    pub lmb: bool,
    #[serde(rename = "Rmb")]
    pub rmb: bool,
    #[serde(rename = "Mmb")]
    pub mmb: bool,
    #[serde(rename = "Su")]
    pub su: bool,
    #[serde(rename = "Sd")]
    pub sd: bool,
}

#[derive(Serialize)]
pub struct FramebufferPayload {
    #[serde(rename = "Id")]
    pub id: String,
}

#[derive(Serialize)]
pub struct PointerSkinPayload {
    #[serde(rename = "Id")]
    pub id: Option<String>,
    #[serde(rename = "Default")]
    pub default: u8,
    #[serde(rename = "X")]
    pub x: u16,
    #[serde(rename = "Y")]
    pub y: u16,
}

#[derive(Serialize)]
pub struct ServerCutTextPayload {
    #[serde(rename = "Text")]
    pub text: String,
}

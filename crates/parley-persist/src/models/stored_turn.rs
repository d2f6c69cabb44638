use parley_llm::Turn;

use crate::error::Result;

/// Turns are stored as one JSON document per list element
pub fn encode_turn(turn: &Turn) -> Result<String> {
    Ok(serde_json::to_string(turn)?)
}

pub fn decode_turn(raw: &str) -> Result<Turn> {
    Ok(serde_json::from_str(raw)?)
}

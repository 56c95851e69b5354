//! Players and alliances.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a player by name.
///
/// The empty name is reserved for the null player, which owns nothing and
/// fights nobody.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(name: impl Into<String>) -> Self {
        PlayerId(name.into())
    }

    /// The sentinel "no player".
    pub fn null() -> Self {
        PlayerId(String::new())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        PlayerId::null()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player and the alliance it fights with.
///
/// Players sharing an alliance are allied; everyone else is at war.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub alliance: Option<String>,
}

impl Player {
    pub fn new(name: &str, alliance: Option<&str>) -> Self {
        Player {
            id: PlayerId::new(name),
            alliance: alliance.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_player_roundtrip() {
        let null = PlayerId::null();
        assert!(null.is_null());
        assert_eq!(null, PlayerId::default());
        assert!(!PlayerId::new("Germans").is_null());
        assert!(!PlayerId::new("Neutral").is_null());
    }

    #[test]
    fn player_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerId::new("Russians")).unwrap();
        assert_eq!(json, "\"Russians\"");
    }
}

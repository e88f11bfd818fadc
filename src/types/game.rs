use std::{fmt::Display, str::FromStr};

/// Catalogue identifier of a game, parsed from a known alias or a raw numeric id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameId(u64);

impl GameId {
    pub const FORTNITE: GameId = GameId(33214);
    pub const APEX_LEGENDS: GameId = GameId(511224);
}

impl FromStr for GameId {
    type Err = Box<dyn std::error::Error + Sync + Send>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fortnite" => Ok(Self::FORTNITE),
            "apex" => Ok(Self::APEX_LEGENDS),
            _ => s.parse().map(Self).map_err(|_| {
                Box::from(format!(
                    "'{s}' is neither a known game alias (fortnite, apex) nor a numeric id"
                ))
            }),
        }
    }
}

impl Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Closed enumerations shared by every layer of BalatroBot.
//!
//! Everything the peer reports as a bare integer or string code lands in
//! one of these enums as soon as it crosses the wire. A value outside the
//! known set is a decode error, never a silent pass-through, so a drift in
//! the peer's vocabulary is caught at the boundary instead of surfacing
//! later as a confusing comparison failure.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// State: peer phase codes
// ---------------------------------------------------------------------------

/// The phase the peer's game loop is currently in.
///
/// On the wire this is a plain integer (`"state": 7`). The discriminants
/// below are that integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum State {
    SelectingHand = 1,
    HandPlayed = 2,
    DrawToHand = 3,
    GameOver = 4,
    Shop = 5,
    PlayTarot = 6,
    BlindSelect = 7,
    RoundEval = 8,
    TarotPack = 9,
    PlanetPack = 10,
    Menu = 11,
    Tutorial = 12,
    Splash = 13,
    Sandbox = 14,
    SpectralPack = 15,
    DemoCta = 16,
    StandardPack = 17,
    BuffoonPack = 18,
    NewRound = 19,
}

impl State {
    /// Every known phase, in code order.
    pub const ALL: [State; 19] = [
        Self::SelectingHand,
        Self::HandPlayed,
        Self::DrawToHand,
        Self::GameOver,
        Self::Shop,
        Self::PlayTarot,
        Self::BlindSelect,
        Self::RoundEval,
        Self::TarotPack,
        Self::PlanetPack,
        Self::Menu,
        Self::Tutorial,
        Self::Splash,
        Self::Sandbox,
        Self::SpectralPack,
        Self::DemoCta,
        Self::StandardPack,
        Self::BuffoonPack,
        Self::NewRound,
    ];

    /// The integer code used on the wire.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Looks up a phase by its wire code.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// The peer's symbolic name, e.g. `"BLIND_SELECT"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::SelectingHand => "SELECTING_HAND",
            Self::HandPlayed => "HAND_PLAYED",
            Self::DrawToHand => "DRAW_TO_HAND",
            Self::GameOver => "GAME_OVER",
            Self::Shop => "SHOP",
            Self::PlayTarot => "PLAY_TAROT",
            Self::BlindSelect => "BLIND_SELECT",
            Self::RoundEval => "ROUND_EVAL",
            Self::TarotPack => "TAROT_PACK",
            Self::PlanetPack => "PLANET_PACK",
            Self::Menu => "MENU",
            Self::Tutorial => "TUTORIAL",
            Self::Splash => "SPLASH",
            Self::Sandbox => "SANDBOX",
            Self::SpectralPack => "SPECTRAL_PACK",
            Self::DemoCta => "DEMO_CTA",
            Self::StandardPack => "STANDARD_PACK",
            Self::BuffoonPack => "BUFFOON_PACK",
            Self::NewRound => "NEW_ROUND",
        }
    }

    /// Returns `true` for the booster pack opening phases.
    pub fn is_pack(self) -> bool {
        matches!(
            self,
            Self::TarotPack
                | Self::PlanetPack
                | Self::SpectralPack
                | Self::StandardPack
                | Self::BuffoonPack
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i64> for State {
    type Error = ProtocolError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(ProtocolError::UnknownState(code))
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(d)?;
        State::try_from(code).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode: the peer's stable error taxonomy
// ---------------------------------------------------------------------------

/// Which tier of the taxonomy an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The request itself was unreadable or incomplete (`E001`..`E005`).
    Protocol,
    /// Socket creation, binding or connection failed (`E006`..`E008`).
    Network,
    /// The request is well formed but not acceptable now (`E009`..`E012`).
    Validation,
    /// The game rules refused the action (`E013`..`E016`).
    GameLogic,
}

/// A stable error identifier shared with the peer.
///
/// Callers branch on these codes, never on the human message text.
/// Serialized as the short string form (`"E009"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidJson,
    MissingName,
    MissingArguments,
    UnknownFunction,
    InvalidArguments,
    SocketCreateFailed,
    SocketBindFailed,
    ConnectionFailed,
    InvalidGameState,
    InvalidParameter,
    ParameterOutOfRange,
    MissingGameObject,
    DeckNotFound,
    InvalidCardIndex,
    NoDiscardsLeft,
    InvalidAction,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 16] = [
        Self::InvalidJson,
        Self::MissingName,
        Self::MissingArguments,
        Self::UnknownFunction,
        Self::InvalidArguments,
        Self::SocketCreateFailed,
        Self::SocketBindFailed,
        Self::ConnectionFailed,
        Self::InvalidGameState,
        Self::InvalidParameter,
        Self::ParameterOutOfRange,
        Self::MissingGameObject,
        Self::DeckNotFound,
        Self::InvalidCardIndex,
        Self::NoDiscardsLeft,
        Self::InvalidAction,
    ];

    /// The wire identifier, `"E001"` through `"E016"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidJson => "E001",
            Self::MissingName => "E002",
            Self::MissingArguments => "E003",
            Self::UnknownFunction => "E004",
            Self::InvalidArguments => "E005",
            Self::SocketCreateFailed => "E006",
            Self::SocketBindFailed => "E007",
            Self::ConnectionFailed => "E008",
            Self::InvalidGameState => "E009",
            Self::InvalidParameter => "E010",
            Self::ParameterOutOfRange => "E011",
            Self::MissingGameObject => "E012",
            Self::DeckNotFound => "E013",
            Self::InvalidCardIndex => "E014",
            Self::NoDiscardsLeft => "E015",
            Self::InvalidAction => "E016",
        }
    }

    /// The symbolic name, e.g. `"INVALID_GAME_STATE"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidJson => "INVALID_JSON",
            Self::MissingName => "MISSING_NAME",
            Self::MissingArguments => "MISSING_ARGUMENTS",
            Self::UnknownFunction => "UNKNOWN_FUNCTION",
            Self::InvalidArguments => "INVALID_ARGUMENTS",
            Self::SocketCreateFailed => "SOCKET_CREATE_FAILED",
            Self::SocketBindFailed => "SOCKET_BIND_FAILED",
            Self::ConnectionFailed => "CONNECTION_FAILED",
            Self::InvalidGameState => "INVALID_GAME_STATE",
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::ParameterOutOfRange => "PARAMETER_OUT_OF_RANGE",
            Self::MissingGameObject => "MISSING_GAME_OBJECT",
            Self::DeckNotFound => "DECK_NOT_FOUND",
            Self::InvalidCardIndex => "INVALID_CARD_INDEX",
            Self::NoDiscardsLeft => "NO_DISCARDS_LEFT",
            Self::InvalidAction => "INVALID_ACTION",
        }
    }

    pub fn category(self) -> ErrorCategory {
        match self {
            Self::InvalidJson
            | Self::MissingName
            | Self::MissingArguments
            | Self::UnknownFunction
            | Self::InvalidArguments => ErrorCategory::Protocol,
            Self::SocketCreateFailed
            | Self::SocketBindFailed
            | Self::ConnectionFailed => ErrorCategory::Network,
            Self::InvalidGameState
            | Self::InvalidParameter
            | Self::ParameterOutOfRange
            | Self::MissingGameObject => ErrorCategory::Validation,
            Self::DeckNotFound
            | Self::InvalidCardIndex
            | Self::NoDiscardsLeft
            | Self::InvalidAction => ErrorCategory::GameLogic,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownErrorCode(s.to_string()))
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Deck and Stake
// ---------------------------------------------------------------------------

/// The starting decks a run can be launched with.
///
/// Serialized with the in-game display name (`"Red Deck"`), which is
/// what the peer expects in `start_run`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
pub enum Deck {
    #[default]
    #[serde(rename = "Red Deck")]
    Red,
    #[serde(rename = "Blue Deck")]
    Blue,
    #[serde(rename = "Yellow Deck")]
    Yellow,
    #[serde(rename = "Green Deck")]
    Green,
    #[serde(rename = "Black Deck")]
    Black,
    #[serde(rename = "Magic Deck")]
    Magic,
    #[serde(rename = "Nebula Deck")]
    Nebula,
    #[serde(rename = "Ghost Deck")]
    Ghost,
    #[serde(rename = "Abandoned Deck")]
    Abandoned,
    #[serde(rename = "Checkered Deck")]
    Checkered,
    #[serde(rename = "Zodiac Deck")]
    Zodiac,
    #[serde(rename = "Painted Deck")]
    Painted,
    #[serde(rename = "Anaglyph Deck")]
    Anaglyph,
    #[serde(rename = "Plasma Deck")]
    Plasma,
    #[serde(rename = "Erratic Deck")]
    Erratic,
}

impl Deck {
    pub const ALL: [Deck; 15] = [
        Self::Red,
        Self::Blue,
        Self::Yellow,
        Self::Green,
        Self::Black,
        Self::Magic,
        Self::Nebula,
        Self::Ghost,
        Self::Abandoned,
        Self::Checkered,
        Self::Zodiac,
        Self::Painted,
        Self::Anaglyph,
        Self::Plasma,
        Self::Erratic,
    ];

    /// The display name sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "Red Deck",
            Self::Blue => "Blue Deck",
            Self::Yellow => "Yellow Deck",
            Self::Green => "Green Deck",
            Self::Black => "Black Deck",
            Self::Magic => "Magic Deck",
            Self::Nebula => "Nebula Deck",
            Self::Ghost => "Ghost Deck",
            Self::Abandoned => "Abandoned Deck",
            Self::Checkered => "Checkered Deck",
            Self::Zodiac => "Zodiac Deck",
            Self::Painted => "Painted Deck",
            Self::Anaglyph => "Anaglyph Deck",
            Self::Plasma => "Plasma Deck",
            Self::Erratic => "Erratic Deck",
        }
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Deck {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|d| d.as_str() == s).ok_or_else(|| {
            ProtocolError::InvalidParameter {
                field: "deck",
                reason: format!("unknown deck {s:?}"),
            }
        })
    }
}

/// Difficulty level of a run, `White` (1) through `Gold` (8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum Stake {
    #[default]
    White = 1,
    Red = 2,
    Green = 3,
    Black = 4,
    Blue = 5,
    Purple = 6,
    Orange = 7,
    Gold = 8,
}

impl Stake {
    pub const MIN_LEVEL: u8 = 1;
    pub const MAX_LEVEL: u8 = 8;

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Some(match level {
            1 => Self::White,
            2 => Self::Red,
            3 => Self::Green,
            4 => Self::Black,
            5 => Self::Blue,
            6 => Self::Purple,
            7 => Self::Orange,
            8 => Self::Gold,
            _ => return None,
        })
    }
}

impl Serialize for Stake {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.level())
    }
}

impl<'de> Deserialize<'de> for Stake {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u8::deserialize(d)?;
        Stake::from_level(level).ok_or_else(|| {
            de::Error::custom(format!("stake level {level} not in 1..=8"))
        })
    }
}

// =========================================================================
// Tests
// =========================================================================

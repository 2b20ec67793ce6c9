//! Typed request and response models.
//!
//! Requests implement [`ApiCall`]: they know their function name and can
//! check their own field constraints before anything touches the socket.
//! Responses are parsed into closed schemas wherever the peer's shape is
//! fixed (`Game`, `Card`), while [`GameState`] keeps call-specific extras
//! (shop listings, consumables, `waitingFor`) in an open map.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::{check_permutation, MAX_HAND_SELECTION};
use crate::types::{Deck, ErrorCode, Stake, State};
use crate::ProtocolError;

/// A JSON object, as used for free-form context and config maps.
pub type JsonObject = Map<String, Value>;

// ---------------------------------------------------------------------------
// Envelope: ApiRequest
// ---------------------------------------------------------------------------

/// One named call with its arguments, exactly as it travels on the wire.
///
/// Older run logs spell the arguments field `params`; both are accepted
/// when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiRequest {
    pub name: String,
    #[serde(alias = "params")]
    pub arguments: Value,
}

impl ApiRequest {
    /// Builds a request, treating `null` arguments as an empty object.
    ///
    /// # Errors
    /// `InvalidMessage` if the name is empty or the arguments are neither
    /// an object nor an array.
    pub fn new(
        name: impl Into<String>,
        arguments: Value,
    ) -> Result<Self, ProtocolError> {
        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let request = Self {
            name: name.into(),
            arguments,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.name.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "request name is empty".into(),
            ));
        }
        if !(self.arguments.is_object() || self.arguments.is_array()) {
            return Err(ProtocolError::InvalidMessage(format!(
                "arguments for `{}` must be an object or array",
                self.name
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Typed calls
// ---------------------------------------------------------------------------

/// A typed request for one peer function.
///
/// The serialized form of `Self` is sent as the `arguments` field.
pub trait ApiCall: Serialize {
    /// The peer function name, e.g. `"start_run"`.
    const NAME: &'static str;

    /// The response type the peer answers with.
    type Response: ApiResponse;

    /// Checks field constraints locally. Default: accept.
    fn validate(&self) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Validates and wraps the request into its wire envelope.
    fn to_request(&self) -> Result<ApiRequest, ProtocolError> {
        self.validate()?;
        let arguments =
            serde_json::to_value(self).map_err(ProtocolError::Encode)?;
        ApiRequest::new(Self::NAME, arguments)
    }
}

/// A reply shape that can be checked beyond what serde enforces.
pub trait ApiResponse: DeserializeOwned {
    /// Cross-field checks. Default: none.
    fn check(&self) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Deserializes and checks a raw reply.
    fn parse(value: Value) -> Result<Self, ProtocolError> {
        let parsed: Self =
            serde_json::from_value(value).map_err(ProtocolError::Decode)?;
        parsed.check()?;
        Ok(parsed)
    }
}

/// `get_game_state` and `go_to_menu` take no arguments.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GetGameState {}

impl ApiCall for GetGameState {
    const NAME: &'static str = "get_game_state";
    type Response = GameState;
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GoToMenu {}

impl ApiCall for GoToMenu {
    const NAME: &'static str = "go_to_menu";
    type Response = GameState;
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CashOut {}

impl ApiCall for CashOut {
    const NAME: &'static str = "cash_out";
    type Response = GameState;
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GetSaveInfo {}

impl ApiCall for GetSaveInfo {
    const NAME: &'static str = "get_save_info";
    type Response = SaveInfo;
}

/// Starts a new run from the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartRunRequest {
    pub deck: Deck,
    /// Stake level, `1..=8`. Kept as a raw level so out-of-range input
    /// is reported with the offending value.
    #[serde(default = "default_stake")]
    pub stake: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
}

fn default_stake() -> u8 {
    Stake::White.level()
}

impl StartRunRequest {
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            stake: default_stake(),
            seed: None,
            challenge: None,
        }
    }

    pub fn stake(mut self, stake: Stake) -> Self {
        self.stake = stake.level();
        self
    }

    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn challenge(mut self, challenge: impl Into<String>) -> Self {
        self.challenge = Some(challenge.into());
        self
    }
}

impl ApiCall for StartRunRequest {
    const NAME: &'static str = "start_run";
    type Response = GameState;

    fn validate(&self) -> Result<(), ProtocolError> {
        if Stake::from_level(self.stake).is_none() {
            return Err(ProtocolError::OutOfRange {
                field: "stake",
                value: i64::from(self.stake),
                min: i64::from(Stake::MIN_LEVEL),
                max: i64::from(Stake::MAX_LEVEL),
            });
        }
        if self.seed.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ProtocolError::InvalidParameter {
                field: "seed",
                reason: "seed must not be blank".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlindAction {
    Skip,
    Select,
}

/// Skips or selects the blind on deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlindActionRequest {
    pub action: BlindAction,
}

impl ApiCall for BlindActionRequest {
    const NAME: &'static str = "skip_or_select_blind";
    type Response = GameState;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandAction {
    PlayHand,
    Discard,
}

/// Plays or discards 1 to 5 cards from the hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandActionRequest {
    pub action: HandAction,
    pub cards: Vec<usize>,
}

impl ApiCall for HandActionRequest {
    const NAME: &'static str = "play_hand_or_discard";
    type Response = GameState;

    fn validate(&self) -> Result<(), ProtocolError> {
        let n = self.cards.len();
        if n == 0 || n > MAX_HAND_SELECTION {
            return Err(ProtocolError::OutOfRange {
                field: "cards",
                value: n as i64,
                min: 1,
                max: MAX_HAND_SELECTION as i64,
            });
        }
        let mut sorted = self.cards.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != n {
            return Err(ProtocolError::InvalidParameter {
                field: "cards",
                reason: format!("duplicate card indices in {:?}", self.cards),
            });
        }
        Ok(())
    }
}

/// What to do in the shop.
///
/// Internally tagged so the wire form is `{"action": "buy_card", "index": 0}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ShopActionRequest {
    NextRound,
    BuyCard { index: usize },
    Reroll,
}

impl ApiCall for ShopActionRequest {
    const NAME: &'static str = "shop";
    type Response = GameState;
}

/// Uses the consumable at `index`, optionally targeting hand cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UseConsumableRequest {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<usize>>,
}

impl ApiCall for UseConsumableRequest {
    const NAME: &'static str = "use_consumable";
    type Response = GameState;

    fn validate(&self) -> Result<(), ProtocolError> {
        match &self.cards {
            Some(cards) if cards.len() > MAX_HAND_SELECTION => {
                Err(ProtocolError::OutOfRange {
                    field: "cards",
                    value: cards.len() as i64,
                    min: 0,
                    max: MAX_HAND_SELECTION as i64,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Reorders the consumable slots. The peer spells the field
/// `consumeables`, so that is what goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RearrangeConsumablesRequest {
    pub consumeables: Vec<usize>,
}

impl ApiCall for RearrangeConsumablesRequest {
    const NAME: &'static str = "rearrange_consumeables";
    type Response = GameState;

    fn validate(&self) -> Result<(), ProtocolError> {
        check_permutation(&self.consumeables).map_err(|reason| {
            ProtocolError::InvalidParameter {
                field: "consumeables",
                reason,
            }
        })
    }
}

/// Swaps the peer's in-memory session for the save at `save_path`
/// without restarting the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadSaveRequest {
    pub save_path: String,
}

impl ApiCall for LoadSaveRequest {
    const NAME: &'static str = "load_save";
    type Response = GameState;

    fn validate(&self) -> Result<(), ProtocolError> {
        if self.save_path.trim().is_empty() {
            return Err(ProtocolError::InvalidParameter {
                field: "save_path",
                reason: "path is empty".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A playing card as reported in the hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Card {
    pub config: JsonObject,
    pub label: String,
}

/// Round and economy fields of an active run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Game {
    pub blind_on_deck: Option<String>,
    pub hands_played: i64,
    pub current_round: JsonObject,
    pub skips: i64,
    pub discount_percent: i64,
    pub interest_cap: i64,
    pub chips: i64,
    pub inflation: i64,
    pub round: i64,
    pub dollars: i64,
    pub max_jokers: i64,
    pub bankrupt_at: i64,
}

/// Prefix of top-level keys that only exist while the peer is in the shop.
pub const SHOP_KEY_PREFIX: &str = "shop_";

/// A snapshot of the peer's game.
///
/// `state`, `game`, `hand` and `jokers` are checked strictly. Anything
/// else at the top level is call-specific and kept in `extensions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub state: State,
    #[serde(default)]
    pub game: Option<Game>,
    #[serde(default)]
    pub hand: Vec<Card>,
    #[serde(default)]
    pub jokers: Vec<JsonObject>,
    #[serde(flatten)]
    pub extensions: JsonObject,
}

impl GameState {
    /// Parses and validates a raw response payload.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let state: Self =
            serde_json::from_value(value).map_err(ProtocolError::Decode)?;
        state.validate()?;
        Ok(state)
    }

    /// Checks cross-field consistency that serde cannot express.
    ///
    /// Shop listings (`shop_jokers`, `shop_vouchers`, ...) are only valid
    /// while `state` is [`State::Shop`].
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.state != State::Shop {
            if let Some(key) =
                self.extensions.keys().find(|k| k.starts_with(SHOP_KEY_PREFIX))
            {
                return Err(ProtocolError::InvalidMessage(format!(
                    "`{key}` present outside the shop (state {})",
                    self.state
                )));
            }
        }
        Ok(())
    }

    /// Looks up a call-specific top-level field.
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }
}

impl ApiResponse for GameState {
    fn check(&self) -> Result<(), ProtocolError> {
        self.validate()
    }
}

/// Where the peer keeps its save file, as reported by `get_save_info`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveInfo {
    pub profile_path: Option<String>,
    pub save_directory: Option<String>,
    pub save_file_path: Option<String>,
    pub has_active_run: bool,
    pub save_exists: bool,
}

impl ApiResponse for SaveInfo {}

/// The peer's structured error reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: ErrorCode,
    #[serde(default)]
    pub state: Option<i64>,
    #[serde(default)]
    pub context: Option<JsonObject>,
}

impl ErrorResponse {
    /// Returns `true` if a raw reply is error-shaped. The presence of the
    /// `error` key decides, whatever else the object carries.
    pub fn is_error_shaped(value: &Value) -> bool {
        value.get("error").is_some()
    }
}

// ---------------------------------------------------------------------------
// Run logs
// ---------------------------------------------------------------------------

/// One line of a recorded run: the call that was made and the game state
/// observed right before it.
///
/// `game_state` is kept as raw JSON so replays compare exactly what was
/// recorded; [`JsonlLogEntry::parsed_state`] validates it on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonlLogEntry {
    pub timestamp_ms: u64,
    pub function: ApiRequest,
    pub game_state: Value,
}

impl JsonlLogEntry {
    pub fn parsed_state(&self) -> Result<GameState, ProtocolError> {
        GameState::from_value(self.game_state.clone())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =====================================================================
    // ApiRequest
    // =====================================================================

    #[test]
    fn test_api_request_null_arguments_become_object() {
        let req = ApiRequest::new("get_game_state", Value::Null).unwrap();
        assert_eq!(req.arguments, json!({}));
    }

    #[test]
    fn test_api_request_rejects_scalar_arguments() {
        let err = ApiRequest::new("start_run", json!(3)).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
    }

    #[test]
    fn test_api_request_accepts_params_alias() {
        let req: ApiRequest =
            serde_json::from_str(r#"{"name":"cash_out","params":{}}"#).unwrap();
        assert_eq!(req.name, "cash_out");
        let out = serde_json::to_value(&req).unwrap();
        assert!(out.get("arguments").is_some());
    }

    // =====================================================================
    // Typed requests
    // =====================================================================

    #[test]
    fn test_start_run_request_wire_shape() {
        let req = StartRunRequest::new(Deck::Red).seed("EXAMPLE");
        let wire = req.to_request().unwrap();
        assert_eq!(wire.name, "start_run");
        assert_eq!(
            wire.arguments,
            json!({"deck": "Red Deck", "stake": 1, "seed": "EXAMPLE"})
        );
    }

    #[test]
    fn test_start_run_request_rejects_stake_out_of_range() {
        let mut req = StartRunRequest::new(Deck::Blue);
        req.stake = 9;
        let err = req.validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParameterOutOfRange);
    }

    #[test]
    fn test_start_run_request_rejects_unknown_fields() {
        let result: Result<StartRunRequest, _> =
            serde_json::from_value(json!({"deck": "Red Deck", "speed": 2}));
        assert!(result.is_err());
    }

    #[test]
    fn test_hand_action_request_card_count_bounds() {
        let empty = HandActionRequest {
            action: HandAction::PlayHand,
            cards: vec![],
        };
        assert_eq!(
            empty.validate().unwrap_err().code(),
            ErrorCode::ParameterOutOfRange
        );

        let six = HandActionRequest {
            action: HandAction::Discard,
            cards: vec![0, 1, 2, 3, 4, 5],
        };
        assert!(six.validate().is_err());

        let ok = HandActionRequest {
            action: HandAction::PlayHand,
            cards: vec![0, 1, 2, 3],
        };
        ok.validate().unwrap();
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"action": "play_hand", "cards": [0, 1, 2, 3]})
        );
    }

    #[test]
    fn test_blind_action_literal_set() {
        let ok: BlindActionRequest =
            serde_json::from_value(json!({"action": "select"})).unwrap();
        assert_eq!(ok.action, BlindAction::Select);
        let bad: Result<BlindActionRequest, _> =
            serde_json::from_value(json!({"action": "reroll"}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_shop_action_wire_forms() {
        assert_eq!(
            serde_json::to_value(ShopActionRequest::NextRound).unwrap(),
            json!({"action": "next_round"})
        );
        assert_eq!(
            serde_json::to_value(ShopActionRequest::BuyCard { index: 1 })
                .unwrap(),
            json!({"action": "buy_card", "index": 1})
        );
    }

    #[test]
    fn test_rearrange_consumables_rejects_duplicates() {
        let req = RearrangeConsumablesRequest {
            consumeables: vec![0, 0],
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);

        let ok = RearrangeConsumablesRequest {
            consumeables: vec![1, 0],
        };
        ok.validate().unwrap();
    }

    #[test]
    fn test_use_consumable_omits_missing_cards() {
        let req = UseConsumableRequest {
            index: 0,
            cards: None,
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"index": 0}));
    }

    #[test]
    fn test_unit_requests_send_empty_object() {
        let wire = GetGameState {}.to_request().unwrap();
        assert_eq!(wire.arguments, json!({}));
        assert_eq!(CashOut::NAME, "cash_out");
    }

    // =====================================================================
    // GameState
    // =====================================================================

    fn shop_state() -> Value {
        json!({
            "state": 5,
            "game": {"round": 1, "dollars": 10},
            "hand": [],
            "jokers": [],
            "shop_jokers": {"cards": [], "config": {}}
        })
    }

    #[test]
    fn test_game_state_keeps_extensions() {
        let state = GameState::from_value(shop_state()).unwrap();
        assert_eq!(state.state, State::Shop);
        assert!(state.extension("shop_jokers").is_some());
        assert_eq!(state.game.as_ref().unwrap().dollars, 10);
    }

    #[test]
    fn test_game_state_rejects_shop_keys_outside_shop() {
        let mut raw = shop_state();
        raw["state"] = json!(7);
        let err = GameState::from_value(raw).unwrap_err();
        assert!(err.to_string().contains("shop_jokers"));
    }

    #[test]
    fn test_game_state_rejects_unknown_state_code() {
        let err = GameState::from_value(json!({"state": 99})).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_game_state_rejects_unknown_game_field() {
        let raw = json!({"state": 1, "game": {"round": 1, "mystery": true}});
        assert!(GameState::from_value(raw).is_err());
    }

    #[test]
    fn test_card_is_closed_schema() {
        let raw = json!({
            "state": 1,
            "hand": [{"label": "Ace", "config": {}, "rank": "A"}]
        });
        assert!(GameState::from_value(raw).is_err());
    }

    // =====================================================================
    // ErrorResponse / log entries
    // =====================================================================

    #[test]
    fn test_error_response_parses_peer_payload() {
        let raw = json!({
            "error": "Invalid game state",
            "error_code": "E009",
            "state": 1
        });
        assert!(ErrorResponse::is_error_shaped(&raw));
        let err: ErrorResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(err.error_code, ErrorCode::InvalidGameState);
        assert_eq!(err.state, Some(1));
        assert!(err.context.is_none());
    }

    #[test]
    fn test_log_entry_parses_and_validates_state() {
        let line = r#"{"timestamp_ms":1,"function":{"name":"go_to_menu","arguments":{}},"game_state":{"state":11}}"#;
        let entry: JsonlLogEntry = serde_json::from_str(line).unwrap();
        assert_eq!(entry.parsed_state().unwrap().state, State::Menu);
    }
}

//! Messages the peer sends in answer to a poll.

use std::fmt;
use std::str::FromStr;

use balatrobot_protocol::State;
use serde_json::Value;

use crate::BotError;

/// The decision the peer is blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitingFor {
    /// Answered by the bot itself from its [`BotConfig`](crate::BotConfig).
    StartRun,
    SkipOrSelectBlind,
    SelectCardsFromHand,
    SelectShopAction,
    SelectBoosterAction,
    SellJokers,
    RearrangeJokers,
    UseOrSellConsumables,
    RearrangeConsumables,
    RearrangeHand,
}

impl WaitingFor {
    pub const ALL: [Self; 10] = [
        Self::StartRun,
        Self::SkipOrSelectBlind,
        Self::SelectCardsFromHand,
        Self::SelectShopAction,
        Self::SelectBoosterAction,
        Self::SellJokers,
        Self::RearrangeJokers,
        Self::UseOrSellConsumables,
        Self::RearrangeConsumables,
        Self::RearrangeHand,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartRun => "start_run",
            Self::SkipOrSelectBlind => "skip_or_select_blind",
            Self::SelectCardsFromHand => "select_cards_from_hand",
            Self::SelectShopAction => "select_shop_action",
            Self::SelectBoosterAction => "select_booster_action",
            Self::SellJokers => "sell_jokers",
            Self::RearrangeJokers => "rearrange_jokers",
            Self::UseOrSellConsumables => "use_or_sell_consumables",
            Self::RearrangeConsumables => "rearrange_consumables",
            Self::RearrangeHand => "rearrange_hand",
        }
    }
}

impl fmt::Display for WaitingFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaitingFor {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| {
                BotError::ProtocolViolation(format!("unknown waitingFor {s:?}"))
            })
    }
}

/// A peer request for one decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRequest {
    pub state: State,
    pub waiting_for: WaitingFor,
    /// The whole message, for strategies that need more than the
    /// dispatch fields.
    pub raw: Value,
}

impl DecisionRequest {
    /// Looks up a top-level field of the raw message.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Number of cards currently in hand, zero when the peer sent none.
    pub fn hand_len(&self) -> usize {
        self.raw
            .get("hand")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    pub fn is_game_over(&self) -> bool {
        self.state == State::GameOver
    }
}

/// Everything a poll can be answered with.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerMessage {
    /// A free-form status line (the `"response"` key). Needs no action.
    Response(Value),
    /// The peer is busy and not waiting for input.
    Idle { state: Option<State> },
    Decision(DecisionRequest),
}

impl PeerMessage {
    /// Classifies a raw reply.
    ///
    /// # Errors
    /// [`BotError::ProtocolViolation`] for non-JSON bytes, a non-object
    /// reply, an unknown phase code, or a missing or unknown `waitingFor`
    /// while `waitingForAction` is set.
    pub fn parse(bytes: &[u8]) -> Result<Self, BotError> {
        let raw: Value = serde_json::from_slice(bytes).map_err(|e| {
            BotError::ProtocolViolation(format!("reply is not JSON: {e}"))
        })?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self, BotError> {
        if !raw.is_object() {
            return Err(BotError::ProtocolViolation(format!(
                "expected a JSON object, got {raw}"
            )));
        }
        if let Some(response) = raw.get("response") {
            return Ok(Self::Response(response.clone()));
        }

        let state = match raw.get("state") {
            None | Some(Value::Null) => None,
            Some(code) => Some(parse_state(code)?),
        };
        let waiting = raw
            .get("waitingForAction")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !waiting {
            return Ok(Self::Idle { state });
        }

        let state = state.ok_or_else(|| {
            BotError::ProtocolViolation("decision request without state".into())
        })?;
        let waiting_for = raw
            .get("waitingFor")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BotError::ProtocolViolation(
                    "decision request without waitingFor".into(),
                )
            })?
            .parse()?;

        Ok(Self::Decision(DecisionRequest {
            state,
            waiting_for,
            raw,
        }))
    }
}

fn parse_state(code: &Value) -> Result<State, BotError> {
    let n = code.as_i64().ok_or_else(|| {
        BotError::ProtocolViolation(format!("state is not an integer: {code}"))
    })?;
    State::try_from(n)
        .map_err(|_| BotError::ProtocolViolation(format!("unknown state code {n}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_waiting_for_round_trip() {
        for w in WaitingFor::ALL {
            assert_eq!(w.as_str().parse::<WaitingFor>().unwrap(), w);
        }
    }

    #[test]
    fn test_unknown_waiting_for_is_violation() {
        let msg = json!({"state": 1, "waitingForAction": true, "waitingFor": "dance"});
        let err = PeerMessage::from_value(msg).unwrap_err();
        assert!(matches!(err, BotError::ProtocolViolation(m) if m.contains("dance")));
    }

    #[test]
    fn test_decision_parsed() {
        let msg = json!({
            "state": 7,
            "waitingForAction": true,
            "waitingFor": "skip_or_select_blind",
            "hand": [{}, {}]
        });
        let PeerMessage::Decision(req) = PeerMessage::from_value(msg).unwrap() else {
            panic!("expected a decision");
        };
        assert_eq!(req.state, State::BlindSelect);
        assert_eq!(req.waiting_for, WaitingFor::SkipOrSelectBlind);
        assert_eq!(req.hand_len(), 2);
        assert!(!req.is_game_over());
    }

    #[test]
    fn test_response_key_wins() {
        let msg = json!({"response": "ok", "waitingForAction": true});
        assert_eq!(
            PeerMessage::from_value(msg).unwrap(),
            PeerMessage::Response(json!("ok"))
        );
    }

    #[test]
    fn test_not_waiting_is_idle() {
        let msg = json!({"state": 3, "waitingForAction": false});
        assert_eq!(
            PeerMessage::from_value(msg).unwrap(),
            PeerMessage::Idle { state: Some(State::DrawToHand) }
        );
    }

    #[test]
    fn test_unknown_state_is_violation() {
        let msg = json!({"state": 42, "waitingForAction": true, "waitingFor": "sell_jokers"});
        assert!(PeerMessage::from_value(msg).is_err());
    }

    #[test]
    fn test_non_json_is_violation() {
        assert!(matches!(
            PeerMessage::parse(b"HELLO?"),
            Err(BotError::ProtocolViolation(_))
        ));
    }
}

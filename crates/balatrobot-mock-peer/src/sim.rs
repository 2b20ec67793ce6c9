//! A tiny deterministic stand-in for the game.
//!
//! Only the phase machine and the bookkeeping the client can observe are
//! modelled. Every played hand wins.
//!
//! ```text
//! MENU → BLIND_SELECT → SELECTING_HAND → ROUND_EVAL → SHOP → BLIND_SELECT
//! ```

use balatrobot_protocol::{Deck, ErrorCode, Stake, State};
use serde_json::{json, Map, Value};

const HAND_SIZE: usize = 8;
const DISCARDS_PER_ROUND: i64 = 3;
const HANDS_PER_ROUND: i64 = 4;
const CASH_OUT_REWARD: i64 = 5;
const REROLL_COST: i64 = 5;
const SHOP_CARD_COST: i64 = 4;

const RANKS: [&str; 13] = [
    "Ace", "King", "Queen", "Jack", "10", "9", "8", "7", "6", "5", "4", "3",
    "2",
];
const SUITS: [&str; 4] = ["Spades", "Hearts", "Clubs", "Diamonds"];

/// Where the simulated game keeps its save file, in the peer's own
/// `C:` convention.
pub const DEFAULT_SAVE_PATH: &str =
    "C:/Users/steamuser/AppData/Roaming/Balatro/1/save.jkr";

/// A peer error reply before serialization.
#[derive(Debug, Clone)]
pub struct SimError {
    pub code: ErrorCode,
    pub message: String,
    pub context: Map<String, Value>,
}

impl SimError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Map::new(),
        }
    }

    fn ctx(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
struct Run {
    seed_offset: usize,
    round: i64,
    dollars: i64,
    hands_played: i64,
    hands_left: i64,
    discards_left: i64,
    skips: i64,
    chips: i64,
    drawn: usize,
    hand: Vec<Value>,
    consumables: Vec<Value>,
    shop_cards: Vec<Value>,
}

/// The simulated game.
#[derive(Debug, Clone)]
pub struct GameSim {
    state: State,
    run: Option<Run>,
    save_path: String,
    loaded_saves: Vec<String>,
}

impl Default for GameSim {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_PATH)
    }
}

impl GameSim {
    pub fn new(save_path: impl Into<String>) -> Self {
        Self {
            state: State::Menu,
            run: None,
            save_path: save_path.into(),
            loaded_saves: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Save paths passed to `load_save`, oldest first.
    pub fn loaded_saves(&self) -> &[String] {
        &self.loaded_saves
    }

    /// Handles one decoded request and returns the reply object.
    pub fn handle(&mut self, request: &Value) -> Value {
        match self.dispatch(request) {
            Ok(value) => value,
            Err(err) => {
                let mut reply = json!({
                    "error": err.message,
                    "error_code": err.code.as_str(),
                    "state": self.state.code(),
                });
                if !err.context.is_empty() {
                    reply["context"] = Value::Object(err.context);
                }
                reply
            }
        }
    }

    fn dispatch(&mut self, request: &Value) -> Result<Value, SimError> {
        let Some(name) = request.get("name").and_then(Value::as_str) else {
            return Err(SimError::new(
                ErrorCode::MissingName,
                "Message must contain a name",
            ));
        };
        let Some(args) = request.get("arguments") else {
            return Err(SimError::new(
                ErrorCode::MissingArguments,
                "Message must contain arguments",
            ));
        };

        match name {
            "get_game_state" => {}
            "go_to_menu" => {
                self.state = State::Menu;
                self.run = None;
            }
            "start_run" => self.start_run(args)?,
            "skip_or_select_blind" => self.blind(args)?,
            "play_hand_or_discard" => self.hand_action(args)?,
            "cash_out" => self.cash_out()?,
            "shop" => self.shop(args)?,
            "use_consumable" => self.use_consumable(args)?,
            "rearrange_consumeables" => self.rearrange_consumables(args)?,
            "get_save_info" => return Ok(self.save_info()),
            "load_save" => self.load_save(args)?,
            other => {
                return Err(SimError::new(
                    ErrorCode::UnknownFunction,
                    format!("Unknown function name: {other}"),
                )
                .ctx("name", other));
            }
        }
        Ok(self.snapshot())
    }

    // -- handlers ----------------------------------------------------------

    fn require(&self, phase: State, message: &str) -> Result<(), SimError> {
        if self.state != phase {
            return Err(SimError::new(ErrorCode::InvalidGameState, message)
                .ctx("current_state", self.state.code()));
        }
        Ok(())
    }

    fn run_mut(&mut self) -> Result<&mut Run, SimError> {
        let state = self.state.code();
        self.run.as_mut().ok_or_else(|| {
            SimError::new(ErrorCode::MissingGameObject, "No active run")
                .ctx("current_state", state)
        })
    }

    fn start_run(&mut self, args: &Value) -> Result<(), SimError> {
        self.require(State::Menu, "Cannot start run when not in menu")?;
        let Some(deck) = args.get("deck").and_then(Value::as_str) else {
            return Err(SimError::new(
                ErrorCode::InvalidParameter,
                "Missing required field: deck",
            ));
        };
        if deck.parse::<Deck>().is_err() {
            return Err(SimError::new(ErrorCode::DeckNotFound, "Invalid deck name")
                .ctx("deck", deck));
        }
        let stake = args.get("stake").and_then(Value::as_i64).unwrap_or(1);
        if u8::try_from(stake).ok().and_then(Stake::from_level).is_none() {
            return Err(SimError::new(
                ErrorCode::ParameterOutOfRange,
                "Stake out of range",
            )
            .ctx("stake", stake));
        }
        let seed = args.get("seed").and_then(Value::as_str).unwrap_or("");
        let seed_offset = seed.bytes().map(usize::from).sum::<usize>();

        self.run = Some(Run {
            seed_offset,
            round: 0,
            dollars: 4,
            hands_played: 0,
            hands_left: HANDS_PER_ROUND,
            discards_left: DISCARDS_PER_ROUND,
            skips: 0,
            chips: 0,
            drawn: 0,
            hand: Vec::new(),
            consumables: vec![
                card("Pluto", "c_pluto"),
                card("The Fool", "c_fool"),
            ],
            shop_cards: Vec::new(),
        });
        self.state = State::BlindSelect;
        Ok(())
    }

    fn blind(&mut self, args: &Value) -> Result<(), SimError> {
        self.require(
            State::BlindSelect,
            "Cannot skip or select blind when not in blind selection",
        )?;
        let action = args.get("action").and_then(Value::as_str).unwrap_or("");
        let run = self.run_mut()?;
        match action {
            "select" => {
                run.round += 1;
                run.hands_left = HANDS_PER_ROUND;
                run.discards_left = DISCARDS_PER_ROUND;
                let hand = (0..HAND_SIZE).map(|_| run.draw()).collect();
                run.hand = hand;
                self.state = State::SelectingHand;
            }
            "skip" => run.skips += 1,
            other => {
                return Err(SimError::new(
                    ErrorCode::InvalidParameter,
                    "Invalid action for skip_or_select_blind",
                )
                .ctx("action", other));
            }
        }
        Ok(())
    }

    fn hand_action(&mut self, args: &Value) -> Result<(), SimError> {
        self.require(
            State::SelectingHand,
            "Cannot play hand or discard when not selecting hand",
        )?;
        let action = args.get("action").and_then(Value::as_str).unwrap_or("");
        let cards = index_list(args.get("cards"));
        let run = self.run_mut()?;
        let Some(cards) = cards.filter(|c| !c.is_empty()) else {
            return Err(SimError::new(
                ErrorCode::InvalidParameter,
                "Invalid card selection",
            ));
        };
        if let Some(bad) = cards.iter().find(|i| **i >= run.hand.len()) {
            return Err(SimError::new(ErrorCode::InvalidCardIndex, "Invalid card index")
                .ctx("index", *bad as u64)
                .ctx("hand_size", run.hand.len() as u64));
        }

        match action {
            "play_hand" => {
                run.hands_played += 1;
                run.hands_left -= 1;
                run.chips += 100 * cards.len() as i64;
                run.hand.clear();
                self.state = State::RoundEval;
            }
            "discard" => {
                if run.discards_left == 0 {
                    return Err(SimError::new(
                        ErrorCode::NoDiscardsLeft,
                        "No discards left",
                    ));
                }
                run.discards_left -= 1;
                for i in cards {
                    let fresh = run.draw();
                    run.hand[i] = fresh;
                }
            }
            other => {
                return Err(SimError::new(
                    ErrorCode::InvalidParameter,
                    "Invalid action for play_hand_or_discard",
                )
                .ctx("action", other));
            }
        }
        Ok(())
    }

    fn cash_out(&mut self) -> Result<(), SimError> {
        self.require(
            State::RoundEval,
            "Cannot cash out when not in round evaluation",
        )?;
        let run = self.run_mut()?;
        run.dollars += CASH_OUT_REWARD;
        run.shop_cards = vec![card("Joker", "j_joker"), card("Greedy Joker", "j_greedy_joker")];
        self.state = State::Shop;
        Ok(())
    }

    fn shop(&mut self, args: &Value) -> Result<(), SimError> {
        self.require(State::Shop, "Cannot use shop when not in shop")?;
        let action = args.get("action").and_then(Value::as_str).unwrap_or("");
        let index = args.get("index").and_then(Value::as_u64);
        let run = self.run_mut()?;
        match action {
            "next_round" => {
                run.shop_cards.clear();
                self.state = State::BlindSelect;
            }
            "reroll" => {
                if run.dollars < REROLL_COST {
                    return Err(SimError::new(
                        ErrorCode::InvalidAction,
                        "Not enough dollars to reroll",
                    )
                    .ctx("dollars", run.dollars));
                }
                run.dollars -= REROLL_COST;
                run.shop_cards.reverse();
            }
            "buy_card" => {
                let Some(i) = index
                    .map(|i| i as usize)
                    .filter(|i| *i < run.shop_cards.len())
                else {
                    return Err(SimError::new(
                        ErrorCode::ParameterOutOfRange,
                        "Card index out of range",
                    )
                    .ctx("index", index.map_or(Value::Null, Value::from)));
                };
                if run.dollars < SHOP_CARD_COST {
                    return Err(SimError::new(ErrorCode::InvalidAction, "Card is not affordable")
                        .ctx("dollars", run.dollars));
                }
                run.dollars -= SHOP_CARD_COST;
                run.shop_cards.remove(i);
            }
            other => {
                return Err(SimError::new(ErrorCode::InvalidAction, "Invalid action for shop")
                    .ctx("action", other));
            }
        }
        Ok(())
    }

    fn use_consumable(&mut self, args: &Value) -> Result<(), SimError> {
        let index = args.get("index").and_then(Value::as_u64);
        let run = self.run_mut()?;
        if run.consumables.is_empty() {
            return Err(SimError::new(ErrorCode::MissingGameObject, "No consumables available"));
        }
        let max_index = run.consumables.len() - 1;
        match index.map(|i| i as usize) {
            Some(i) if i <= max_index => {
                run.consumables.remove(i);
                Ok(())
            }
            _ => Err(SimError::new(ErrorCode::ParameterOutOfRange, "Consumable index out of range")
                .ctx("index", index.map_or(Value::Null, Value::from))
                .ctx("max_index", max_index as u64)),
        }
    }

    fn rearrange_consumables(&mut self, args: &Value) -> Result<(), SimError> {
        let order = index_list(args.get("consumeables"));
        let run = self.run_mut()?;
        let Some(order) = order else {
            return Err(SimError::new(
                ErrorCode::InvalidParameter,
                "Missing required field: consumeables",
            ));
        };
        if order.len() != run.consumables.len() {
            return Err(SimError::new(
                ErrorCode::ParameterOutOfRange,
                "Invalid number of consumeables",
            )
            .ctx("expected", run.consumables.len() as u64)
            .ctx("got", order.len() as u64));
        }
        if let Some(bad) = order.iter().find(|i| **i >= run.consumables.len()) {
            return Err(SimError::new(
                ErrorCode::ParameterOutOfRange,
                "Consumable index out of range",
            )
            .ctx("index", *bad as u64)
            .ctx("max_index", (run.consumables.len() - 1) as u64));
        }
        let reordered = order.iter().map(|i| run.consumables[*i].clone()).collect();
        run.consumables = reordered;
        Ok(())
    }

    fn save_info(&self) -> Value {
        let dir = self
            .save_path
            .rsplit_once('/')
            .map_or(self.save_path.as_str(), |(dir, _)| dir);
        json!({
            "profile_path": "1",
            "save_directory": dir,
            "save_file_path": self.save_path,
            "has_active_run": self.run.is_some(),
            "save_exists": self.run.is_some(),
        })
    }

    fn load_save(&mut self, args: &Value) -> Result<(), SimError> {
        let Some(path) = args.get("save_path").and_then(Value::as_str) else {
            return Err(SimError::new(
                ErrorCode::InvalidParameter,
                "Missing required field: save_path",
            ));
        };
        self.loaded_saves.push(path.to_string());
        self.state = State::Menu;
        self.run = None;
        self.start_run(&json!({"deck": "Red Deck", "seed": path}))
    }

    // -- snapshot ----------------------------------------------------------

    /// The full state object the peer would report right now.
    pub fn snapshot(&self) -> Value {
        let mut out = json!({
            "state": self.state.code(),
            "hand": [],
            "jokers": [],
        });
        let Some(run) = &self.run else {
            return out;
        };
        let blind_on_deck = if self.state == State::BlindSelect {
            Value::from("Small")
        } else {
            Value::Null
        };
        out["game"] = json!({
            "blind_on_deck": blind_on_deck,
            "hands_played": run.hands_played,
            "current_round": {
                "hands_left": run.hands_left,
                "discards_left": run.discards_left,
            },
            "skips": run.skips,
            "discount_percent": 0,
            "interest_cap": 25,
            "chips": run.chips,
            "inflation": 0,
            "round": run.round,
            "dollars": run.dollars,
            "max_jokers": 5,
            "bankrupt_at": 0,
        });
        out["hand"] = Value::Array(run.hand.clone());
        out["consumables"] = json!({ "cards": run.consumables });
        if self.state == State::Shop {
            out["shop_jokers"] = json!({
                "cards": run.shop_cards,
                "config": {"card_limit": 2},
            });
            out["shop_vouchers"] = json!({"cards": [], "config": {"card_limit": 1}});
            out["shop_booster"] = json!({"cards": [], "config": {"card_limit": 2}});
        }
        out
    }
}

impl Run {
    fn draw(&mut self) -> Value {
        let n = (self.seed_offset + self.drawn * 7) % (RANKS.len() * SUITS.len());
        self.drawn += 1;
        let rank = RANKS[n % RANKS.len()];
        let suit = SUITS[n / RANKS.len()];
        json!({
            "label": format!("{rank} of {suit}"),
            "config": {"card_key": format!("{}_{}", &suit[..1], rank)},
        })
    }
}

fn card(label: &str, key: &str) -> Value {
    json!({"label": label, "config": {"center_key": key}})
}

fn index_list(value: Option<&Value>) -> Option<Vec<usize>> {
    value?
        .as_array()?
        .iter()
        .map(|v| v.as_u64().map(|n| n as usize))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(sim: &mut GameSim, name: &str, args: Value) -> Value {
        sim.handle(&json!({"name": name, "arguments": args}))
    }

    #[test]
    fn test_full_round_reaches_shop_and_back() {
        let mut sim = GameSim::default();
        let args = json!({"deck": "Red Deck", "stake": 1, "seed": "EXAMPLE"});
        let s = call(&mut sim, "start_run", args);
        assert_eq!(s["state"], State::BlindSelect.code());
        let s = call(&mut sim, "skip_or_select_blind", json!({"action": "select"}));
        assert_eq!(s["hand"].as_array().unwrap().len(), 8);
        let args = json!({"action": "play_hand", "cards": [0, 1, 2, 3]});
        let s = call(&mut sim, "play_hand_or_discard", args);
        assert_eq!(s["state"], State::RoundEval.code());
        let s = call(&mut sim, "cash_out", json!({}));
        assert_eq!(s["state"], State::Shop.code());
        assert!(s.get("shop_jokers").is_some());
        let s = call(&mut sim, "shop", json!({"action": "next_round"}));
        assert_eq!(s["state"], State::BlindSelect.code());
        assert!(s.get("shop_jokers").is_none());
    }

    #[test]
    fn test_cash_out_outside_round_eval_is_e009() {
        let mut sim = GameSim::default();
        let reply = call(&mut sim, "cash_out", json!({}));
        assert_eq!(reply["error_code"], "E009");
        assert_eq!(reply["context"]["current_state"], State::Menu.code());
    }

    #[test]
    fn test_same_seed_same_hand() {
        let deal = || {
            let mut sim = GameSim::default();
            call(&mut sim, "start_run", json!({"deck": "Red Deck", "seed": "ABC"}));
            call(&mut sim, "skip_or_select_blind", json!({"action": "select"}))["hand"].clone()
        };
        assert_eq!(deal(), deal());
    }

    #[test]
    fn test_unknown_function_is_e004() {
        let mut sim = GameSim::default();
        let reply = call(&mut sim, "fold", json!({}));
        assert_eq!(reply["error_code"], "E004");
    }
}

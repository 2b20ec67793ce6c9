//! Bot actions and their two wire encodings.
//!
//! A strategy answers each decision point with an [`ActionSchema`]: one
//! [`Action`] verb plus an ordered argument list. Every verb has a fixed
//! argument shape ([`Action::arg_shape`]), which serves two purposes:
//!
//! - [`ActionSchema::validate`] rejects a malformed action before it is
//!   sent, so the peer never sees an argument list it cannot parse.
//! - [`ActionSchema::decode_pipe`] can recover typed arguments from the
//!   legacy pipe form, where every field is just text.
//!
//! ```text
//! JSON form:  {"action":"PLAY_HAND","args":[[0,1,2]]}
//! Pipe form:  PLAY_HAND|0,1,2
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Deck, Stake};
use crate::ProtocolError;

/// The most cards a single play or discard may contain.
pub const MAX_HAND_SELECTION: usize = 5;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// The verbs a bot can send back to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Action {
    SelectBlind = 1,
    SkipBlind = 2,
    PlayHand = 3,
    DiscardHand = 4,
    EndShop = 5,
    RerollShop = 6,
    BuyCard = 7,
    BuyVoucher = 8,
    BuyBooster = 9,
    SelectBoosterCard = 10,
    SkipBoosterPack = 11,
    SellJoker = 12,
    UseConsumable = 13,
    SellConsumable = 14,
    RearrangeJokers = 15,
    RearrangeConsumables = 16,
    RearrangeHand = 17,
    Pass = 18,
    StartRun = 19,
    SendGamestate = 20,
}

/// The type of one positional action argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A list of zero-based indices.
    Indices,
    /// A single integer.
    Int,
    /// Free text.
    Text,
    /// Free text or nothing.
    OptText,
}

impl Action {
    pub const ALL: [Action; 20] = [
        Self::SelectBlind,
        Self::SkipBlind,
        Self::PlayHand,
        Self::DiscardHand,
        Self::EndShop,
        Self::RerollShop,
        Self::BuyCard,
        Self::BuyVoucher,
        Self::BuyBooster,
        Self::SelectBoosterCard,
        Self::SkipBoosterPack,
        Self::SellJoker,
        Self::UseConsumable,
        Self::SellConsumable,
        Self::RearrangeJokers,
        Self::RearrangeConsumables,
        Self::RearrangeHand,
        Self::Pass,
        Self::StartRun,
        Self::SendGamestate,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.code() == code)
    }

    /// The verb as it appears on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Self::SelectBlind => "SELECT_BLIND",
            Self::SkipBlind => "SKIP_BLIND",
            Self::PlayHand => "PLAY_HAND",
            Self::DiscardHand => "DISCARD_HAND",
            Self::EndShop => "END_SHOP",
            Self::RerollShop => "REROLL_SHOP",
            Self::BuyCard => "BUY_CARD",
            Self::BuyVoucher => "BUY_VOUCHER",
            Self::BuyBooster => "BUY_BOOSTER",
            Self::SelectBoosterCard => "SELECT_BOOSTER_CARD",
            Self::SkipBoosterPack => "SKIP_BOOSTER_PACK",
            Self::SellJoker => "SELL_JOKER",
            Self::UseConsumable => "USE_CONSUMABLE",
            Self::SellConsumable => "SELL_CONSUMABLE",
            Self::RearrangeJokers => "REARRANGE_JOKERS",
            Self::RearrangeConsumables => "REARRANGE_CONSUMABLES",
            Self::RearrangeHand => "REARRANGE_HAND",
            Self::Pass => "PASS",
            Self::StartRun => "START_RUN",
            Self::SendGamestate => "SEND_GAMESTATE",
        }
    }

    /// The positional arguments this verb carries.
    pub fn arg_shape(self) -> &'static [ArgKind] {
        use ArgKind::*;
        match self {
            Self::SelectBlind
            | Self::SkipBlind
            | Self::EndShop
            | Self::RerollShop
            | Self::SkipBoosterPack
            | Self::Pass
            | Self::SendGamestate => &[],
            Self::PlayHand
            | Self::DiscardHand
            | Self::BuyCard
            | Self::BuyVoucher
            | Self::BuyBooster
            | Self::SellJoker
            | Self::UseConsumable
            | Self::SellConsumable
            | Self::RearrangeJokers
            | Self::RearrangeConsumables
            | Self::RearrangeHand => &[Indices],
            // booster card picks, then hand cards the picked card targets
            Self::SelectBoosterCard => &[Indices, Indices],
            // stake, deck, seed, challenge
            Self::StartRun => &[Int, Text, Text, OptText],
        }
    }

    /// Returns `true` for verbs whose index list must be a permutation.
    pub fn is_rearrange(self) -> bool {
        matches!(
            self,
            Self::RearrangeJokers
                | Self::RearrangeConsumables
                | Self::RearrangeHand
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| ProtocolError::UnknownAction(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ActionArg / ActionSchema
// ---------------------------------------------------------------------------

/// One positional argument of an action.
///
/// `#[serde(untagged)]` keeps the JSON form natural: `3`, `"Red Deck"`,
/// `[0, 1]` or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionArg {
    Int(i64),
    Text(String),
    Indices(Vec<usize>),
    Null,
}

impl ActionArg {
    fn fits(&self, kind: ArgKind) -> bool {
        matches!(
            (kind, self),
            (ArgKind::Indices, Self::Indices(_))
                | (ArgKind::Int, Self::Int(_))
                | (ArgKind::Text, Self::Text(_))
                | (ArgKind::OptText, Self::Text(_) | Self::Null)
        )
    }
}

/// A decided action: a verb plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSchema {
    pub action: Action,
    #[serde(default)]
    pub args: Vec<ActionArg>,
}

impl ActionSchema {
    /// An action without arguments.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            args: Vec::new(),
        }
    }

    /// An action whose single argument is an index list.
    pub fn with_indices(
        action: Action,
        indices: impl Into<Vec<usize>>,
    ) -> Self {
        Self {
            action,
            args: vec![ActionArg::Indices(indices.into())],
        }
    }

    /// The `START_RUN` action for the given run settings.
    pub fn start_run(
        stake: Stake,
        deck: Deck,
        seed: impl Into<String>,
        challenge: Option<String>,
    ) -> Self {
        Self {
            action: Action::StartRun,
            args: vec![
                ActionArg::Int(i64::from(stake.level())),
                ActionArg::Text(deck.as_str().to_string()),
                ActionArg::Text(seed.into()),
                challenge.map_or(ActionArg::Null, ActionArg::Text),
            ],
        }
    }

    /// Checks the arguments against the verb's shape and index rules.
    ///
    /// Rearrange verbs must carry a permutation of `0..n`: a duplicated or
    /// skipped index is rejected rather than resolved peer-side.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let shape = self.action.arg_shape();
        if self.args.len() != shape.len() {
            return Err(self.invalid(format!(
                "expected {} argument(s), got {}",
                shape.len(),
                self.args.len()
            )));
        }
        for (pos, (arg, kind)) in self.args.iter().zip(shape).enumerate() {
            if !arg.fits(*kind) {
                return Err(self.invalid(format!(
                    "argument {pos} should be {kind:?}, got {arg:?}"
                )));
            }
        }

        match (self.action, self.args.first()) {
            (Action::PlayHand | Action::DiscardHand, Some(ActionArg::Indices(cards))) => {
                if cards.is_empty() || cards.len() > MAX_HAND_SELECTION {
                    return Err(self.invalid(format!(
                        "must select 1..={MAX_HAND_SELECTION} cards, got {}",
                        cards.len()
                    )));
                }
                if has_duplicates(cards) {
                    return Err(self.invalid("card indices repeat".into()));
                }
            }
            (action, Some(ActionArg::Indices(order))) if action.is_rearrange() => {
                check_permutation(order).map_err(|reason| self.invalid(reason))?;
            }
            _ => {}
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> ProtocolError {
        ProtocolError::InvalidAction {
            action: self.action,
            reason,
        }
    }

    // -- pipe form --------------------------------------------------------

    /// Renders the legacy pipe-delimited form.
    ///
    /// Fields are joined by `|`, index lists by `,`, and a missing optional
    /// text is written as `None`. Text containing `|` cannot be represented
    /// and is rejected, as is the literal text `None` in an optional field,
    /// which would read back as missing.
    pub fn encode_pipe(&self) -> Result<String, ProtocolError> {
        let shape = self.action.arg_shape();
        let mut fields = Vec::with_capacity(self.args.len() + 1);
        fields.push(self.action.name().to_string());
        for (pos, arg) in self.args.iter().enumerate() {
            fields.push(match arg {
                ActionArg::Int(n) => n.to_string(),
                ActionArg::Text(s) if s.contains('|') => {
                    return Err(self.invalid(format!(
                        "text argument {s:?} contains the field separator"
                    )));
                }
                ActionArg::Text(s)
                    if s == "None" && shape.get(pos) == Some(&ArgKind::OptText) =>
                {
                    return Err(self.invalid(
                        "optional text `None` is indistinguishable from a missing value"
                            .to_string(),
                    ));
                }
                ActionArg::Text(s) => s.clone(),
                ActionArg::Indices(idx) => idx
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
                ActionArg::Null => "None".to_string(),
            });
        }
        Ok(fields.join("|"))
    }

    /// Parses the pipe form back into a typed action.
    ///
    /// The verb's argument shape decides how each field is read, so
    /// `"3"` is an index list for `BUY_CARD` but an integer stake for
    /// `START_RUN`.
    pub fn decode_pipe(line: &str) -> Result<Self, ProtocolError> {
        let mut fields = line.trim_end_matches(['\r', '\n']).split('|');
        let verb = fields.next().unwrap_or_default();
        let action: Action = verb.parse()?;
        let rest: Vec<&str> = fields.collect();
        let shape = action.arg_shape();
        if rest.len() != shape.len() {
            return Err(ProtocolError::InvalidAction {
                action,
                reason: format!(
                    "expected {} field(s) after the verb, got {}",
                    shape.len(),
                    rest.len()
                ),
            });
        }

        let mut args = Vec::with_capacity(shape.len());
        for (field, kind) in rest.into_iter().zip(shape) {
            let arg = match kind {
                ArgKind::Indices if field.is_empty() => {
                    ActionArg::Indices(Vec::new())
                }
                ArgKind::Indices => ActionArg::Indices(
                    field
                        .split(',')
                        .map(|n| n.trim().parse::<usize>())
                        .collect::<Result<_, _>>()
                        .map_err(|e| ProtocolError::InvalidAction {
                            action,
                            reason: format!("bad index list {field:?}: {e}"),
                        })?,
                ),
                ArgKind::Int => ActionArg::Int(field.parse().map_err(|e| {
                    ProtocolError::InvalidAction {
                        action,
                        reason: format!("bad integer {field:?}: {e}"),
                    }
                })?),
                ArgKind::OptText if field == "None" => ActionArg::Null,
                ArgKind::Text | ArgKind::OptText => {
                    ActionArg::Text(field.to_string())
                }
            };
            args.push(arg);
        }
        Ok(Self { action, args })
    }
}

fn has_duplicates(indices: &[usize]) -> bool {
    let mut seen = HashSet::with_capacity(indices.len());
    !indices.iter().all(|i| seen.insert(*i))
}

/// Checks that `order` contains every index in `0..order.len()` once.
pub(crate) fn check_permutation(order: &[usize]) -> Result<(), String> {
    if has_duplicates(order) {
        return Err(format!("duplicate indices in {order:?}"));
    }
    if let Some(bad) = order.iter().find(|i| **i >= order.len()) {
        return Err(format!(
            "index {bad} out of range for {} item(s)",
            order.len()
        ));
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================

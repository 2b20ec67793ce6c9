//! The decision interface a bot plugs into the loop.

use balatrobot_protocol::ActionSchema;

use crate::DecisionRequest;

/// Decision logic for a bot.
///
/// One method per decision point. Returning `None` is a contract
/// violation: the loop stops with [`BotError::NoAction`](crate::BotError)
/// instead of skipping the step. Starting a run is not a strategy
/// decision; the loop answers it from its [`BotConfig`](crate::BotConfig).
///
/// # Example
///
/// ```rust
/// use balatrobot_bot::{DecisionRequest, Strategy};
/// use balatrobot_protocol::{Action, ActionSchema};
///
/// struct Passive;
///
/// impl Strategy for Passive {
///     fn skip_or_select_blind(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
///         Some(ActionSchema::new(Action::SelectBlind))
///     }
///     fn select_cards_from_hand(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
///         Some(ActionSchema::with_indices(Action::PlayHand, [0]))
///     }
///     fn select_shop_action(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
///         Some(ActionSchema::new(Action::EndShop))
///     }
///     fn select_booster_action(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
///         Some(ActionSchema::new(Action::SkipBoosterPack))
///     }
///     fn sell_jokers(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
///         Some(ActionSchema::with_indices(Action::SellJoker, Vec::new()))
///     }
///     fn rearrange_jokers(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
///         Some(ActionSchema::with_indices(Action::RearrangeJokers, Vec::new()))
///     }
///     fn use_or_sell_consumables(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
///         Some(ActionSchema::with_indices(Action::UseConsumable, Vec::new()))
///     }
///     fn rearrange_consumables(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
///         Some(ActionSchema::with_indices(Action::RearrangeConsumables, Vec::new()))
///     }
///     fn rearrange_hand(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
///         Some(ActionSchema::with_indices(Action::RearrangeHand, Vec::new()))
///     }
/// }
/// ```
pub trait Strategy {
    fn skip_or_select_blind(&mut self, req: &DecisionRequest) -> Option<ActionSchema>;

    fn select_cards_from_hand(&mut self, req: &DecisionRequest) -> Option<ActionSchema>;

    fn select_shop_action(&mut self, req: &DecisionRequest) -> Option<ActionSchema>;

    fn select_booster_action(&mut self, req: &DecisionRequest) -> Option<ActionSchema>;

    fn sell_jokers(&mut self, req: &DecisionRequest) -> Option<ActionSchema>;

    fn rearrange_jokers(&mut self, req: &DecisionRequest) -> Option<ActionSchema>;

    fn use_or_sell_consumables(&mut self, req: &DecisionRequest) -> Option<ActionSchema>;

    fn rearrange_consumables(&mut self, req: &DecisionRequest) -> Option<ActionSchema>;

    fn rearrange_hand(&mut self, req: &DecisionRequest) -> Option<ActionSchema>;
}

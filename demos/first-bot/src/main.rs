use balatrobot::prelude::*;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Always takes the blind, plays the leftmost card and leaves the shop.
/// Everything optional is skipped.
struct FirstCard;

impl Strategy for FirstCard {
    fn skip_or_select_blind(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
        Some(ActionSchema::new(Action::SelectBlind))
    }

    fn select_cards_from_hand(&mut self, req: &DecisionRequest) -> Option<ActionSchema> {
        if req.hand_len() == 0 {
            return None;
        }
        Some(ActionSchema::with_indices(Action::PlayHand, [0]))
    }

    fn select_shop_action(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
        Some(ActionSchema::new(Action::EndShop))
    }

    fn select_booster_action(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
        Some(ActionSchema::new(Action::SkipBoosterPack))
    }

    fn sell_jokers(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
        Some(ActionSchema::with_indices(Action::SellJoker, Vec::new()))
    }

    fn rearrange_jokers(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
        Some(ActionSchema::with_indices(Action::RearrangeJokers, Vec::new()))
    }

    fn use_or_sell_consumables(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
        Some(ActionSchema::with_indices(Action::UseConsumable, Vec::new()))
    }

    fn rearrange_consumables(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
        Some(ActionSchema::with_indices(Action::RearrangeConsumables, Vec::new()))
    }

    fn rearrange_hand(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
        Some(ActionSchema::with_indices(Action::RearrangeHand, Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Error> {
    balatrobot::init_tracing();

    let seed = std::env::args().nth(1).unwrap_or_else(|| "EXAMPLE".to_string());
    let transport = TransportConfig::from_env()?.validated();
    let config = BotConfig::new(Deck::Red, Stake::White).seed(seed);
    tracing::info!(addr = %transport.addr(), "starting first-bot");

    let mut bot = Bot::new(FirstCard, config, transport);
    let summary = bot.run().await?;

    tracing::info!(
        actions = summary.actions,
        reconnects = summary.reconnects,
        final_state = ?summary.final_state,
        "run over"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(hand: usize) -> DecisionRequest {
        let cards: Vec<_> = (0..hand)
            .map(|i| serde_json::json!({"label": format!("card {i}")}))
            .collect();
        DecisionRequest {
            state: State::SelectingHand,
            waiting_for: WaitingFor::SelectCardsFromHand,
            raw: serde_json::json!({"state": 1, "hand": cards}),
        }
    }

    #[test]
    fn test_plays_first_card() {
        let action = FirstCard
            .select_cards_from_hand(&request(8))
            .unwrap();
        assert_eq!(action.encode_pipe().unwrap(), "PLAY_HAND|0");
    }

    #[test]
    fn test_empty_hand_gives_no_action() {
        assert!(FirstCard
            .select_cards_from_hand(&request(0))
            .is_none());
    }
}

//! The two peer calls checkpointing needs.

use balatrobot_client::{BalatroClient, BalatroError};
use balatrobot_protocol::{GameState, SaveInfo};
use balatrobot_transport::Connection;

/// Access to the peer's live save.
///
/// Implemented for [`BalatroClient`]; tests substitute an in-memory peer.
pub trait SaveBackend {
    /// Save location and status, with paths already in local form.
    async fn save_info(&mut self) -> Result<SaveInfo, BalatroError>;

    /// Swaps in the save at a local path without restarting the game.
    async fn load_save(&mut self, path: &str) -> Result<GameState, BalatroError>;
}

impl<C: Connection> SaveBackend for BalatroClient<C> {
    async fn save_info(&mut self) -> Result<SaveInfo, BalatroError> {
        self.get_save_info().await
    }

    async fn load_save(&mut self, path: &str) -> Result<GameState, BalatroError> {
        BalatroClient::load_save(self, path).await
    }
}

use std::sync::Arc;

use ancestral_core::{
    Catalog, ClientId, Dice, Dispatch, GameServer, RandDice, ServerConfig, SessionManager, Story,
};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;

/// Holds all shared state for the console.
///
/// The console hosts an in-process server and speaks for any number of
/// local clients; `acting` is the one whose intents are sent next.
#[derive(Clone)]
pub struct CliContext {
    pub server: GameServer,
    pub config: Arc<ServerConfig>,
    pub catalog: Arc<Catalog>,
    acting: Arc<RwLock<ClientId>>,
    printer: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl CliContext {
    /// Build the server. The returned receiver carries every dispatched
    /// event; hand it to [`CliContext::start_printer`].
    pub fn new(
        config: ServerConfig,
        seed: Option<u64>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Dispatch>), String> {
        let catalog = Catalog::load_or_bundled(config.data.catalog_path.as_deref())
            .map_err(|e| format!("error: {e}"))?;
        let catalog = Arc::new(catalog);
        let story = Arc::new(Story::load_or_empty(config.data.story_path.as_deref()));

        let dice: Box<dyn Dice> = match seed {
            Some(seed) => Box::new(RandDice::seeded(seed)),
            None => Box::new(RandDice::from_entropy()),
        };
        let manager = SessionManager::new(Arc::clone(&catalog), story, config.clone(), dice);
        let (server, events) = GameServer::new(manager);

        let ctx = Self {
            server,
            config: Arc::new(config),
            catalog,
            acting: Arc::new(RwLock::new(ClientId::from("player1"))),
            printer: Arc::new(RwLock::new(None)),
        };
        Ok((ctx, events))
    }

    /// Print dispatched events as they arrive.
    pub async fn start_printer(&self, mut events: mpsc::UnboundedReceiver<Dispatch>) {
        let handle = tokio::spawn(async move {
            while let Some(dispatch) = events.recv().await {
                crate::commands::print_dispatch(&dispatch);
            }
        });
        if let Some(previous) = self.printer.write().await.replace(handle) {
            previous.abort();
        }
    }

    pub async fn stop_printer(&self) {
        if let Some(handle) = self.printer.write().await.take() {
            handle.abort();
        }
    }

    pub async fn acting(&self) -> ClientId {
        self.acting.read().await.clone()
    }

    pub async fn set_acting(&self, client: ClientId) {
        *self.acting.write().await = client;
    }
}

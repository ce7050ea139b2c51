use contextor::Contextor;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator over the vector store and the providers.
    pub contextor: Contextor,
}

impl AppState {
    pub fn new(contextor: Contextor) -> Self {
        Self { contextor }
    }
}

pub mod classifier;

pub use classifier::{CallClassifier, Classification, LlmConfig, LlmProvider};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Erro HTTP com o provedor de LLM: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provedor de LLM respondeu {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Nenhuma chave de LLM configurada")]
    MissingApiKey,
}

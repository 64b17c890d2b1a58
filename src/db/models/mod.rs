pub mod chat;
pub mod prediction;

pub use chat::ChatMessage;
pub use prediction::{PredictionKind, SavedPrediction};

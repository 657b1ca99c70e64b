mod message;
mod request;
mod response;
mod usage;

pub use message::{ChatMessage, ChatMessageBuilder, ChatRole};
pub use request::{
    ChatRequest, EmbeddingRequest, InputType, ModelRequest, RequestKind, RerankRequest, Truncate,
};
pub use response::{Choice, ChoiceMessage, EmbeddingData, ModelResponse, Ranking};
pub use usage::Usage;

pub mod completion;
pub mod config;
pub mod content_type;
pub mod error;
pub mod fetch;
pub mod formatters;
pub mod normalize;
pub mod page;
pub mod pipeline;
pub mod record;
pub mod recovery;
pub mod schema;
pub mod text;

pub use completion::{
    ChatClient, CompletionAdapter, CompletionService, GenerationParams, Message, ModelPricing, RawCompletion,
    ReplayService, Role, ServiceReply, TokenUsage,
};
pub use config::{CompletionConfig, Config, ConfigBuilder};
pub use content_type::{ContentType, Shape};
pub use error::{SiteliftError, Result};
pub use fetch::{DefaultFetcher, FetchConfig, PageFetcher, Source};
pub use fetch::{fetch_file, fetch_stdin, fetch_url};
pub use formatters::{ContextConfig, ContextFormatter, format_context};
pub use normalize::{RecoveredShape, normalize};
pub use pipeline::{Extractor, Stage, reply_for_error};
pub use record::{ChatReply, ExtractionRequest, ExtractionResult, NormalizedRecord, Record, WebsiteData};
pub use recovery::{RecoveredValue, Strategy, recover};
pub use schema::{Prompt, fallback_record, prompt_for};

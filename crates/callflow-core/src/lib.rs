pub mod config;
pub mod error;
pub mod event;
pub mod settings;
pub mod traits;
pub mod types;

pub use config::EditorConfig;
pub use error::{CallflowError, Result};
pub use event::EventBus;
pub use settings::NodeSettings;
pub use traits::{IdGenerator, UuidIds};
pub use types::*;

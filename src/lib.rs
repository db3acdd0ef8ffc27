pub mod api;
pub mod config;
pub mod detector;
pub mod engine;
pub mod ranker;
pub mod reporter;
pub mod store;
pub mod telegram;
pub mod types;

/// Allora Forge base URL (user/competition data, public proxy — no auth required)
pub const FORGE_API_BASE: &str = "https://forge.allora.network";

/// Version segment of the chain's emissions module endpoints
pub const EMISSIONS_VERSION: &str = "v8";

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

pub mod analytics;
pub mod platform;
pub mod poller;
pub mod trade_log;
pub mod valuator;

pub use analytics::{derive_digest, max_drawdown, performance_metrics};
pub use platform::PlatformClient;
pub use poller::PortfolioPoller;
pub use trade_log::reconstruct_trades;
pub use valuator::{instrument_for, value_portfolio};

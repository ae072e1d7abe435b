pub mod price_store;
pub mod stream;

pub use price_store::PriceStore;
pub use stream::StreamManager;

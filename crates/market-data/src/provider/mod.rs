mod alpha_vantage;
mod polygon;
mod traits;
mod yahoo;

pub use alpha_vantage::AlphaVantageProvider;
pub use polygon::PolygonProvider;
pub use traits::QuoteProvider;
pub use yahoo::YahooProvider;

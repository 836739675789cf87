//! Core data types for the backtesting engine.

mod indicator;
mod ohlcv;
mod order;
mod position;
mod signal;
mod timeframe;
mod trade;
mod view;

pub use indicator::{IndicatorFrame, IndicatorSeries, IndicatorSpec, MacdComponent, RsiSmoothing};
pub use ohlcv::{Bar, BarSeries};
pub use order::{Fill, Order, OrderReason, OrderType, Side};
pub use position::{Portfolio, Position};
pub use signal::{Direction, Signal};
pub use timeframe::Timeframe;
pub use trade::{PortfolioSnapshot, PositionSide, PositionSnapshot, TradeLeg, TradeRecord};
pub use view::MarketView;

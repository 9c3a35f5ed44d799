pub mod candle;
pub mod interval;
pub mod window;

//! Adapters implementing application ports

mod kakao_bus_adapter;

pub use kakao_bus_adapter::{KakaoBusAdapter, map_bus_error};

//! 시그널 수집 도메인 모델.

pub mod entity;
pub mod event;
pub mod signal;

pub use entity::*;
pub use event::*;
pub use signal::*;

pub mod cache;
pub mod diagnose;
pub mod dispatch;
pub mod reference;
pub mod seed;
pub mod sweeper;

//! Background Tasks Module
//!
//! Contains tasks that run periodically alongside a memoizer.
//!
//! # Tasks
//! - Expired-entry sweeper: purges expired results at configured intervals

mod sweeper;

pub use sweeper::spawn_sweeper;

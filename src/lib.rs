//! 食事する哲学者
//!
//! N 人の哲学者が円卓に座り、隣と共有するフォークを2本とも取れたときだけ食べる。
//! フォークを取りに行けるのはゲートを持つ1人だけなので、全員が左のフォークを
//! 握ったまま右を待ち続ける (デッドロック) 状態にはならない。
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use philosophers::{Dinner, DinnerConfig, RandomDelay, StdoutObserver};
//!
//! # async fn dine() -> philosophers::Result<()> {
//! let config = DinnerConfig::default();
//! let dinner = Dinner::start(
//!     &config,
//!     Arc::new(RandomDelay::default()),
//!     Arc::new(StdoutObserver::new(config.meals)),
//! )?;
//! let report = dinner.run().await?;
//! assert!(report.all_done());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod delay;
pub mod dinner;
pub mod error;
pub mod fork;
pub mod gate;
pub mod observer;
pub mod philosopher;
mod token;

pub use config::DinnerConfig;
pub use delay::{Delay, Immediate, Phase, RandomDelay};
pub use dinner::{Canceller, Dinner, DinnerReport, Outcome};
pub use error::{DinnerError, Resource, Result};
pub use fork::{ForkGuard, ForkPool};
pub use gate::{Gate, GateGuard};
pub use observer::{Event, Observer, Recorder, Silent, StdoutObserver, Violation};
pub use philosopher::{Philosopher, PhilosopherId, State};

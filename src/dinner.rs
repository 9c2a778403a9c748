use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::{AbortHandle, JoinHandle};
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::DinnerConfig;
use crate::delay::Delay;
use crate::error::{DinnerError, Result};
use crate::fork::ForkPool;
use crate::gate::Gate;
use crate::observer::Observer;
use crate::philosopher::{Philosopher, PhilosopherId};

// 哲学者1人の結末
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done { meals: usize },
    // 途中で止められた。meals はそれまでに食べ終えた回数
    Cancelled { meals: usize },
}

impl Outcome {
    pub fn meals(&self) -> usize {
        match self {
            Outcome::Done { meals } | Outcome::Cancelled { meals } => *meals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DinnerReport {
    outcomes: Vec<Outcome>,
}

impl DinnerReport {
    // 添字が哲学者の id
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn total_meals(&self) -> usize {
        self.outcomes.iter().map(Outcome::meals).sum()
    }

    pub fn all_done(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o, Outcome::Done { .. }))
    }

    pub fn cancelled(&self) -> Vec<PhilosopherId> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| matches!(o, Outcome::Cancelled { .. }))
            .map(|(id, _)| id)
            .collect()
    }
}

impl fmt::Display for DinnerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, outcome) in self.outcomes.iter().enumerate() {
            match outcome {
                Outcome::Done { meals } => {
                    writeln!(f, "philosopher {id}: done after {meals} meals")?
                }
                Outcome::Cancelled { meals } => {
                    writeln!(f, "philosopher {id}: cancelled after {meals} meals")?
                }
            }
        }
        write!(
            f,
            "{} meals eaten by {} philosophers",
            self.total_meals(),
            self.outcomes.len()
        )
    }
}

/// 哲学者のタスクを止めるためのハンドル
///
/// 止められたタスクの future は drop されるので、握っていたフォークとゲートは
/// JoinHandle が完了する前に返っている
#[derive(Clone)]
pub struct Canceller {
    aborts: Arc<Vec<AbortHandle>>,
}

impl Canceller {
    pub fn cancel(&self, who: PhilosopherId) -> Result<()> {
        let handle = self.aborts.get(who).ok_or(DinnerError::NoSuchPhilosopher {
            who,
            len: self.aborts.len(),
        })?;
        warn!(who, "cancelling philosopher");
        handle.abort();
        Ok(())
    }

    pub fn cancel_all(&self) {
        warn!("cancelling every philosopher");
        for handle in self.aborts.iter() {
            handle.abort();
        }
    }
}

/// 円卓1つ分
///
/// フォークとゲートを作り、哲学者を1人ずつタスクとして起動する。
/// 起動したら放っておかず、`run` で全員の終了を待つ
pub struct Dinner {
    config: DinnerConfig,
    forks: Arc<ForkPool>,
    gate: Arc<Gate>,
    handles: Vec<JoinHandle<Result<usize>>>,
    counters: Vec<Arc<AtomicUsize>>,
    canceller: Canceller,
}

impl Dinner {
    /// tokio ランタイムの中から呼ぶこと
    pub fn start(
        config: &DinnerConfig,
        delay: Arc<dyn Delay>,
        observer: Arc<dyn Observer>,
    ) -> Result<Self> {
        config.validate()?;

        let forks = Arc::new(ForkPool::new(config.philosophers));
        let gate = Arc::new(Gate::new());
        let mut handles = Vec::with_capacity(config.philosophers);
        let mut counters = Vec::with_capacity(config.philosophers);
        let mut aborts = Vec::with_capacity(config.philosophers);

        info!(
            philosophers = config.philosophers,
            meals = config.meals,
            "dinner starts"
        );

        // 哲学者 i はフォーク i と i + 1 を使う
        for id in 0..config.philosophers {
            let p = Philosopher::new(
                id,
                config.meals,
                forks.clone(),
                gate.clone(),
                delay.clone(),
                observer.clone(),
            );
            counters.push(p.meal_counter());

            let handle = tokio::spawn(p.run().instrument(info_span!("philosopher", id)));
            aborts.push(handle.abort_handle());
            handles.push(handle);
        }

        Ok(Dinner {
            config: *config,
            forks,
            gate,
            handles,
            counters,
            canceller: Canceller {
                aborts: Arc::new(aborts),
            },
        })
    }

    pub fn config(&self) -> &DinnerConfig {
        &self.config
    }

    pub fn forks(&self) -> &Arc<ForkPool> {
        &self.forks
    }

    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn cancel(&self, who: PhilosopherId) -> Result<()> {
        self.canceller.cancel(who)
    }

    /// 全員が終わるまで待つ
    ///
    /// キャンセルされた哲学者は報告に残るだけで、他の哲学者はそのまま食べ続ける。
    /// プロトコル違反やパニックは致命的なので、残りを止めてエラーを返す
    pub async fn run(self) -> Result<DinnerReport> {
        let Dinner {
            handles,
            counters,
            canceller,
            ..
        } = self;
        let mut outcomes = Vec::with_capacity(handles.len());

        for (id, (handle, counter)) in handles.into_iter().zip(counters).enumerate() {
            let outcome = match handle.await {
                Ok(Ok(meals)) => Outcome::Done { meals },
                Ok(Err(e)) => {
                    error!(id, "philosopher broke the protocol: {e}");
                    canceller.cancel_all();
                    return Err(e);
                }
                Err(e) if e.is_cancelled() => Outcome::Cancelled {
                    meals: counter.load(Ordering::Acquire),
                },
                Err(_) => {
                    error!(id, "philosopher panicked");
                    canceller.cancel_all();
                    return Err(DinnerError::Panicked(id));
                }
            };
            outcomes.push(outcome);
        }

        let report = DinnerReport { outcomes };
        info!(
            meals = report.total_meals(),
            cancelled = report.cancelled().len(),
            "dinner is over"
        );
        Ok(report)
    }
}

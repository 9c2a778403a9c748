use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use rand::Rng;

use crate::philosopher::PhilosopherId;

// 考える時間、食べる時間の上限
pub const MAX_THINK: Duration = Duration::from_millis(1000);
pub const MAX_EAT: Duration = Duration::from_millis(1000);

// どこで止まっているか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Think,
    Eat,
    // ゲートの中で左のフォークを取った直後
    BetweenForks,
}

/// 哲学者の時間の進め方
///
/// 壁時計に依存させないために外から差し込む。テストでは即座に返したり、
/// わざと特定の哲学者を止めたりする実装を渡す
pub trait Delay: Send + Sync {
    fn pause(&self, who: PhilosopherId, phase: Phase) -> BoxFuture<'_, ()>;
}

/// 上限までのランダムな時間だけ tokio の sleep で待つ
///
/// tokio の時間を止めた (`start_paused`) ランタイムでは一瞬で進む
#[derive(Debug, Clone)]
pub struct RandomDelay {
    think: Duration,
    eat: Duration,
}

impl RandomDelay {
    pub fn new(think: Duration, eat: Duration) -> Self {
        RandomDelay { think, eat }
    }
}

impl Default for RandomDelay {
    fn default() -> Self {
        RandomDelay::new(MAX_THINK, MAX_EAT)
    }
}

impl Delay for RandomDelay {
    fn pause(&self, _who: PhilosopherId, phase: Phase) -> BoxFuture<'_, ()> {
        let max = match phase {
            Phase::Think => self.think,
            Phase::Eat => self.eat,
            Phase::BetweenForks => return futures::future::ready(()).boxed(),
        };
        // ThreadRng は Send じゃないので、future を作る前に長さを決めておく
        let millis = rand::thread_rng().gen_range(0..=max.as_millis() as u64);
        tokio::time::sleep(Duration::from_millis(millis)).boxed()
    }
}

// 待たずにスケジューラへ譲るだけ
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Delay for Immediate {
    fn pause(&self, _who: PhilosopherId, _phase: Phase) -> BoxFuture<'_, ()> {
        tokio::task::yield_now().boxed()
    }
}

#[cfg(test)]
mod test {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_random_delay_is_bounded() {
        let delay = RandomDelay::new(Duration::from_millis(50), Duration::from_millis(20));
        // タイマーは ms 単位に切り上げられるので 1ms だけ余裕を持たせる
        let slack = Duration::from_millis(1);

        for _ in 0..20 {
            let start = Instant::now();
            delay.pause(0, Phase::Think).await;
            assert!(start.elapsed() <= Duration::from_millis(50) + slack);

            let start = Instant::now();
            delay.pause(0, Phase::Eat).await;
            assert!(start.elapsed() <= Duration::from_millis(20) + slack);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pause_between_forks() {
        let start = Instant::now();
        RandomDelay::default().pause(1, Phase::BetweenForks).await;
        Immediate.pause(1, Phase::Think).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

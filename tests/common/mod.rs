#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use philosophers::{Delay, Phase, PhilosopherId};

// デッドロックしていたらここで打ち切る
pub const DEADLINE: Duration = Duration::from_secs(30);

// シードで決まる回数だけスケジューラに譲る
// ゲートの中 (左を取った直後) では多めに譲って、取りかけの時間を長くする
pub struct Jitter {
    rng: Mutex<StdRng>,
    max_yields: usize,
}

impl Jitter {
    pub fn new(seed: u64, max_yields: usize) -> Self {
        Jitter {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            max_yields,
        }
    }
}

impl Delay for Jitter {
    fn pause(&self, _who: PhilosopherId, phase: Phase) -> BoxFuture<'_, ()> {
        let max = match phase {
            Phase::BetweenForks => self.max_yields * 4,
            _ => self.max_yields,
        };
        let n = self.rng.lock().unwrap().gen_range(0..=max);
        async move {
            for _ in 0..n {
                tokio::task::yield_now().await;
            }
        }
        .boxed()
    }
}

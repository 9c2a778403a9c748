use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::delay::{Delay, Phase};
use crate::error::Result;
use crate::fork::{ForkGuard, ForkPool};
use crate::gate::Gate;
use crate::observer::{Event, Observer};

pub type PhilosopherId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Thinking,
    // フォークを取りに行っている
    Hungry,
    Eating,
    Done,
}

// 食事中に握っている左右のフォーク
// フィールドは宣言順に drop されるので、取った順 (左 -> 右) の逆で手放す
struct Pair<'a> {
    right: ForkGuard<'a>,
    left: ForkGuard<'a>,
}

impl<'a> Pair<'a> {
    fn put_down(self) -> Result<()> {
        let Pair { right, left } = self;
        // right を返すのに失敗しても left は drop で手放される
        right.release()?;
        left.release()
    }
}

/// 円卓の哲学者
///
/// 考える -> ゲートに入って左右のフォークを取る -> ゲートを出る -> 食べる -> フォークを置く
/// を quota 回繰り返して終わる
pub struct Philosopher {
    id: PhilosopherId,
    left: usize,
    right: usize,
    quota: usize,
    state: State,
    // 食べ終えた回数。タスクがキャンセルされても外から読めるように共有する
    meals: Arc<AtomicUsize>,
    forks: Arc<ForkPool>,
    gate: Arc<Gate>,
    delay: Arc<dyn Delay>,
    observer: Arc<dyn Observer>,
}

impl Philosopher {
    pub fn new(
        id: PhilosopherId,
        quota: usize,
        forks: Arc<ForkPool>,
        gate: Arc<Gate>,
        delay: Arc<dyn Delay>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Philosopher {
            id,
            left: forks.left_of(id),
            right: forks.right_of(id),
            quota,
            state: State::Thinking,
            meals: Arc::new(AtomicUsize::new(0)),
            forks,
            gate,
            delay,
            observer,
        }
    }

    pub fn id(&self) -> PhilosopherId {
        self.id
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn meals(&self) -> usize {
        self.meals.load(Ordering::Acquire)
    }

    // 食べた回数のカウンタ。run に self を渡した後も読める
    pub fn meal_counter(&self) -> Arc<AtomicUsize> {
        self.meals.clone()
    }

    /// quota 回食べ終えるまで繰り返し、食べた回数を返す
    ///
    /// どの await で future が drop されても、握っているフォークとゲートは
    /// ガードの drop で手放される
    pub async fn run(mut self) -> Result<usize> {
        // ガードはこのローカルの Arc から借りる。self は状態の更新のために空けておく
        let forks = self.forks.clone();
        let gate = self.gate.clone();

        while self.meals() < self.quota {
            self.enter(State::Thinking, Event::Thinking);
            self.delay.pause(self.id, Phase::Think).await;

            self.enter(State::Hungry, Event::Hungry);
            let pair = self.pick_up(&forks, &gate).await?;

            let meal = self.meals() + 1;
            self.enter(State::Eating, Event::Eating { meal });
            self.delay.pause(self.id, Phase::Eat).await;
            self.observer.notify(self.id, Event::Finished { meal });

            pair.put_down()?;
            self.meals.store(meal, Ordering::Release);
        }

        self.enter(State::Done, Event::Done);
        Ok(self.meals())
    }

    // ゲートの中で左 -> 右の順にフォークを取り、取り終えたらすぐゲートを出る
    async fn pick_up<'a>(&self, forks: &'a ForkPool, gate: &Gate) -> Result<Pair<'a>> {
        let inside = gate.enter(self.id).await?;
        trace!(id = self.id, "inside the gate");

        let left = forks.acquire(self.left, self.id).await?;
        self.delay.pause(self.id, Phase::BetweenForks).await;
        let right = forks.acquire(self.right, self.id).await?;

        inside.exit()?;
        Ok(Pair { right, left })
    }

    fn enter(&mut self, state: State, event: Event) {
        debug!(id = self.id, from = ?self.state, to = ?state, "transition");
        self.state = state;
        self.observer.notify(self.id, event);
    }
}

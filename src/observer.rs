use std::sync::{Mutex, PoisonError};

use crate::philosopher::PhilosopherId;

// 哲学者が外に知らせる出来事
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Thinking,
    Hungry,
    // meal は 1 始まり
    Eating { meal: usize },
    // まだ両方のフォークを握ったまま通知される
    Finished { meal: usize },
    Done,
}

/// 状態遷移の観測者
///
/// 同期の約束事には関わらない。notify の中で待ったりしないこと
pub trait Observer: Send + Sync {
    fn notify(&self, who: PhilosopherId, event: Event);
}

// 標準出力に1行ずつ書く
#[derive(Debug, Clone)]
pub struct StdoutObserver {
    quota: usize,
}

impl StdoutObserver {
    pub fn new(quota: usize) -> Self {
        StdoutObserver { quota }
    }
}

impl Observer for StdoutObserver {
    fn notify(&self, who: PhilosopherId, event: Event) {
        match event {
            Event::Thinking => println!("philosopher {who} is thinking"),
            Event::Hungry => println!("philosopher {who} is hungry"),
            Event::Eating { meal } => {
                println!("philosopher {who} is eating (meal {meal}/{})", self.quota)
            }
            Event::Finished { meal } => println!("philosopher {who} finished meal {meal}"),
            Event::Done => println!("philosopher {who} is done"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Observer for Silent {
    fn notify(&self, _who: PhilosopherId, _event: Event) {}
}

// 記録中に見つかった矛盾
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    // 隣り合う2人が同時に食べていた
    NeighboursEating {
        who: PhilosopherId,
        neighbour: PhilosopherId,
    },
    // Eating と Finished が対になっていない
    Unbalanced { who: PhilosopherId, event: Event },
}

#[derive(Debug, Default)]
struct Log {
    events: Vec<(PhilosopherId, Event)>,
    eating: Vec<bool>,
    violations: Vec<Violation>,
    max_eating: usize,
}

/// 出来事をすべて記録し、隣同士が同時に食べていないかをその場で確かめる
///
/// Eating はフォークを取った後、Finished は手放す前に通知されるので、
/// ここで重なって見えたら実際にも重なっている
#[derive(Debug)]
pub struct Recorder {
    seats: usize,
    log: Mutex<Log>,
}

impl Recorder {
    pub fn new(seats: usize) -> Self {
        Recorder {
            seats,
            log: Mutex::new(Log {
                eating: vec![false; seats],
                ..Log::default()
            }),
        }
    }

    pub fn events(&self) -> Vec<(PhilosopherId, Event)> {
        self.lock().events.clone()
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.lock().violations.clone()
    }

    // 同時に食べていた人数の最大値
    pub fn max_eating(&self) -> usize {
        self.lock().max_eating
    }

    pub fn meals_of(&self, who: PhilosopherId) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|(w, e)| *w == who && matches!(e, Event::Eating { .. }))
            .count()
    }

    pub fn total_meals(&self) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|(_, e)| matches!(e, Event::Eating { .. }))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Observer for Recorder {
    fn notify(&self, who: PhilosopherId, event: Event) {
        let mut log = self.lock();
        log.events.push((who, event));

        if who >= self.seats {
            return;
        }

        match event {
            Event::Eating { .. } => {
                if log.eating[who] {
                    log.violations.push(Violation::Unbalanced { who, event });
                }
                for neighbour in [(who + self.seats - 1) % self.seats, (who + 1) % self.seats] {
                    if neighbour != who && log.eating[neighbour] {
                        log.violations
                            .push(Violation::NeighboursEating { who, neighbour });
                    }
                }
                log.eating[who] = true;
                let n = log.eating.iter().filter(|e| **e).count();
                log.max_eating = log.max_eating.max(n);
            }
            Event::Finished { .. } => {
                if !log.eating[who] {
                    log.violations.push(Violation::Unbalanced { who, event });
                }
                log.eating[who] = false;
            }
            _ => {}
        }
    }
}

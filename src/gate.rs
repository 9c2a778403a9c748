use crate::error::{Resource, Result};
use crate::philosopher::PhilosopherId;
use crate::token::{Held, Token};

/// フォークを取りに行く権利
///
/// 中に入れるのは同時に1人だけ。左右のフォークを取り終えたらすぐ出る (食事中は持たない)
/// 取りかけの哲学者が常に高々1人になるので、待ちの循環ができずデッドロックしない
pub struct Gate {
    token: Token,
}

impl Gate {
    pub fn new() -> Self {
        Gate {
            token: Token::new(Resource::Gate),
        }
    }

    pub fn holder(&self) -> Option<PhilosopherId> {
        self.token.holder()
    }

    pub async fn enter(&self, who: PhilosopherId) -> Result<GateGuard<'_>> {
        let held = self.token.take(who).await?;
        Ok(GateGuard { held })
    }

    pub fn exit(&self, who: PhilosopherId) -> Result<()> {
        self.token.give_back(who)
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

pub struct GateGuard<'a> {
    held: Held<'a>,
}

impl<'a> GateGuard<'a> {
    pub fn exit(self) -> Result<()> {
        self.held.release()
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::error::DinnerError;

    #[tokio::test]
    async fn test_enter_exit() {
        let gate = Gate::new();
        assert_eq!(gate.holder(), None);

        let inside = gate.enter(2).await.unwrap();
        assert_eq!(gate.holder(), Some(2));
        inside.exit().unwrap();
        assert_eq!(gate.holder(), None);
    }

    #[tokio::test]
    async fn test_exit_by_outsider() {
        let gate = Gate::new();
        let _inside = gate.enter(0).await.unwrap();

        assert_eq!(
            gate.exit(1),
            Err(DinnerError::NotHolder {
                who: 1,
                resource: Resource::Gate,
                holder: Some(0),
            })
        );
        assert!(matches!(
            gate.enter(0).await,
            Err(DinnerError::AlreadyHeld { who: 0, .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_one_at_a_time() {
        const NUM_TASKS: usize = 6;
        const NUM_LOOP: usize = 300;

        let gate = Arc::new(Gate::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));
        let mut v = Vec::new();

        for who in 0..NUM_TASKS {
            let gate0 = gate.clone();
            let inside0 = inside.clone();
            let max0 = max_inside.clone();
            v.push(tokio::spawn(async move {
                for _ in 0..NUM_LOOP {
                    let g = gate0.enter(who).await.unwrap();
                    let n = inside0.fetch_add(1, Ordering::SeqCst) + 1;
                    max0.fetch_max(n, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    inside0.fetch_sub(1, Ordering::SeqCst);
                    g.exit().unwrap();
                }
            }));
        }

        for t in v {
            t.await.unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(gate.holder(), None);
    }
}

use crate::error::{DinnerError, Resource, Result};
use crate::philosopher::PhilosopherId;
use crate::token::{Held, Token};

/// 円卓に並んだ N 本のフォーク
///
/// フォーク i は哲学者 i (の左手) と哲学者 i - 1 (の右手) で共有される
pub struct ForkPool {
    forks: Vec<Token>,
}

impl ForkPool {
    pub fn new(len: usize) -> Self {
        ForkPool {
            forks: (0..len).map(|i| Token::new(Resource::Fork(i))).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.forks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forks.is_empty()
    }

    // 哲学者 who の左のフォーク
    pub fn left_of(&self, who: PhilosopherId) -> usize {
        who % self.len()
    }

    // 哲学者 who の右のフォーク
    pub fn right_of(&self, who: PhilosopherId) -> usize {
        (who + 1) % self.len()
    }

    pub fn holder(&self, index: usize) -> Result<Option<PhilosopherId>> {
        Ok(self.fork(index)?.holder())
    }

    /// フォーク index が空くまで待ち、who のものにする
    ///
    /// 待ち時間に上限はない。返ったガードを drop すると手放す
    pub async fn acquire(&self, index: usize, who: PhilosopherId) -> Result<ForkGuard<'_>> {
        let held = self.fork(index)?.take(who).await?;
        Ok(ForkGuard { index, held })
    }

    /// 持ち主でない哲学者が呼ぶと `NotHolder`
    pub fn release(&self, index: usize, who: PhilosopherId) -> Result<()> {
        self.fork(index)?.give_back(who)
    }

    fn fork(&self, index: usize) -> Result<&Token> {
        self.forks.get(index).ok_or(DinnerError::NoSuchFork {
            index,
            len: self.len(),
        })
    }
}

// 握っているフォーク1本
pub struct ForkGuard<'a> {
    index: usize,
    held: Held<'a>,
}

impl<'a> ForkGuard<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn release(self) -> Result<()> {
        self.held.release()
    }
}

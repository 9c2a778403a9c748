use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::error::{DinnerError, Resource, Result};
use crate::philosopher::PhilosopherId;

// 誰も保持していないことを表す番兵
const FREE: usize = usize::MAX;

// 同時に1人しか保持できないトークン
// フォークもゲートもこれで実装する
//
// 待機は permit 1 のセマフォで行い、保持者は holder に記録する
// 取得時は permit 獲得 -> holder 設定、解放時は holder クリア -> permit 返却の順
pub(crate) struct Token {
    resource: Resource,
    permit: Semaphore,
    holder: AtomicUsize,
}

impl Token {
    pub(crate) fn new(resource: Resource) -> Self {
        Token {
            resource,
            permit: Semaphore::new(1),
            holder: AtomicUsize::new(FREE),
        }
    }

    pub(crate) fn holder(&self) -> Option<PhilosopherId> {
        match self.holder.load(Ordering::Acquire) {
            FREE => None,
            who => Some(who),
        }
    }

    // 空くまで待ってから who を保持者にする
    // 返ってきた Held を drop すれば解放される
    pub(crate) async fn take(&self, who: PhilosopherId) -> Result<Held<'_>> {
        // 自分が持っているものを待つと永久に起きないので、待つ前に弾く
        if self.holder() == Some(who) {
            error!(who, resource = %self.resource, "double acquire");
            return Err(DinnerError::AlreadyHeld {
                who,
                resource: self.resource,
            });
        }

        // ここが唯一の待機点。キャンセルされても permit はまだ取っていない
        let permit = self
            .permit
            .acquire()
            .await
            .map_err(|_| DinnerError::Closed(self.resource))?;
        permit.forget();

        // permit を持っているのは自分だけなので、holder は必ず FREE のはず
        if let Err(holder) =
            self.holder
                .compare_exchange(FREE, who, Ordering::AcqRel, Ordering::Acquire)
        {
            error!(who, holder, resource = %self.resource, "token taken twice");
            self.permit.add_permits(1);
            return Err(DinnerError::AlreadyHeld {
                who: holder,
                resource: self.resource,
            });
        }

        debug!(who, resource = %self.resource, "taken");
        Ok(Held {
            token: self,
            who,
            armed: true,
        })
    }

    // HELD(who) -> FREE
    pub(crate) fn give_back(&self, who: PhilosopherId) -> Result<()> {
        self.holder
            .compare_exchange(who, FREE, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|holder| {
                error!(who, resource = %self.resource, "release without ownership");
                DinnerError::NotHolder {
                    who,
                    resource: self.resource,
                    holder: (holder != FREE).then_some(holder),
                }
            })?;
        self.permit.add_permits(1);

        debug!(who, resource = %self.resource, "given back");
        Ok(())
    }
}

// トークンを保持している間だけ生きる型
// スコープを抜ける (キャンセルで future ごと drop される場合も含む) と解放される
pub(crate) struct Held<'a> {
    token: &'a Token,
    who: PhilosopherId,
    armed: bool,
}

impl<'a> Held<'a> {
    pub(crate) fn release(mut self) -> Result<()> {
        self.armed = false;
        self.token.give_back(self.who)
    }
}

impl<'a> Drop for Held<'a> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // 保持していることは型が保証しているので、ここで失敗したらどこかで holder が壊れている
        if let Err(e) = self.token.give_back(self.who) {
            error!("failed to release on drop: {e}");
        }
    }
}

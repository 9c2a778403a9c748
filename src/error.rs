use std::fmt;

use thiserror::Error;

use crate::philosopher::PhilosopherId;

// 排他的に保持される資源の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Fork(usize),
    Gate,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Fork(index) => write!(f, "fork {index}"),
            Resource::Gate => write!(f, "gate"),
        }
    }
}

/// 食事の進行で起こりうるエラー
///
/// `NoSuchFork` 以外のプロトコル違反 (`AlreadyHeld`, `NotHolder`, `Closed`) は
/// 正しく動いている哲学者からは決して発生しない。発生したら致命的なバグとして扱い、リトライはしない
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DinnerError {
    #[error("fork {index} does not exist (the table has {len} forks)")]
    NoSuchFork { index: usize, len: usize },

    #[error("philosopher {who} does not exist (the table seats {len})")]
    NoSuchPhilosopher { who: PhilosopherId, len: usize },

    #[error("philosopher {who} tried to take {resource} twice")]
    AlreadyHeld {
        who: PhilosopherId,
        resource: Resource,
    },

    #[error("philosopher {who} released {resource} without owning it (holder: {holder:?})")]
    NotHolder {
        who: PhilosopherId,
        resource: Resource,
        holder: Option<PhilosopherId>,
    },

    #[error("{0} was closed while a philosopher waited on it")]
    Closed(Resource),

    #[error("invalid dinner config: {0}")]
    InvalidConfig(String),

    #[error("philosopher {0} panicked")]
    Panicked(PhilosopherId),
}

pub type Result<T> = std::result::Result<T, DinnerError>;

use crate::error::{DinnerError, Result};

// 哲学者の数
pub const DEFAULT_PHILOSOPHERS: usize = 5;
// 1人あたりの食事回数
pub const DEFAULT_MEALS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DinnerConfig {
    pub philosophers: usize,
    pub meals: usize,
}

impl DinnerConfig {
    pub fn new(philosophers: usize, meals: usize) -> Self {
        DinnerConfig {
            philosophers,
            meals,
        }
    }

    // 1人だと左右のフォークが同じになり、取れなくなる
    pub fn validate(&self) -> Result<()> {
        if self.philosophers < 2 {
            return Err(DinnerError::InvalidConfig(format!(
                "at least 2 philosophers are needed, got {}",
                self.philosophers
            )));
        }
        Ok(())
    }
}

impl Default for DinnerConfig {
    fn default() -> Self {
        DinnerConfig::new(DEFAULT_PHILOSOPHERS, DEFAULT_MEALS)
    }
}

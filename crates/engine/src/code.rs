//! Ticket code generation.

use std::ops::RangeInclusive;

use domain::OrderCode;
use rand::Rng;

/// Numbers a ticket code may carry.
pub const CODE_NUMBERS: RangeInclusive<u16> = 100..=999;

/// Draws random ticket codes (`A123`) for new orders.
///
/// Codes are not unique by construction; the store rejects a code already
/// used on the same operating day and the engine draws again.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    prefix: char,
    numbers: RangeInclusive<u16>,
}

impl CodeGenerator {
    pub fn new(prefix: char) -> Self {
        Self {
            prefix: prefix.to_ascii_uppercase(),
            numbers: CODE_NUMBERS,
        }
    }

    /// Narrows the number range, clamped to three digits.
    pub fn with_numbers(mut self, numbers: RangeInclusive<u16>) -> Self {
        let start = (*numbers.start()).clamp(*CODE_NUMBERS.start(), *CODE_NUMBERS.end());
        let end = (*numbers.end()).clamp(start, *CODE_NUMBERS.end());
        self.numbers = start..=end;
        self
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub fn next_code(&self) -> OrderCode {
        let number = rand::thread_rng().gen_range(self.numbers.clone());
        OrderCode::new(self.prefix, number)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}

//! Size guard: per-file limits and per-archive expansion budgets.

use crate::AdmissionConfig;
use crate::error::LimitExceeded;

/// Returns `true` if `size` is within `limit`.
#[inline]
#[must_use]
pub const fn check(size: u64, limit: u64) -> bool {
    size <= limit
}

/// Applies the configured single-file limit.
///
/// # Errors
///
/// Returns `LimitExceeded::FileSize` when `size` is over the limit.
pub fn check_file_size(size: u64, config: &AdmissionConfig) -> Result<(), LimitExceeded> {
    if check(size, config.max_file_size) {
        Ok(())
    } else {
        Err(LimitExceeded::FileSize {
            size,
            max: config.max_file_size,
        })
    }
}

/// Tracks the cumulative extraction of a single archive.
///
/// Owned by one archive's expansion; nested archives get their own budget
/// derived from their own size.
#[derive(Debug)]
pub struct ExpansionBudget {
    budget: u64,
    extracted: u64,
    members: usize,
    max_members: usize,
}

impl ExpansionBudget {
    /// Creates the budget for an archive of `archive_size` bytes.
    #[must_use]
    pub fn for_archive(archive_size: u64, config: &AdmissionConfig) -> Self {
        Self {
            budget: config.expansion_budget(archive_size),
            extracted: 0,
            members: 0,
            max_members: config.max_archive_members,
        }
    }

    /// Checks the sum of declared member sizes before anything is extracted.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded::Expansion` if the archive claims to expand past
    /// its budget.
    pub fn check_declared_total(&self, declared_total: u64) -> Result<(), LimitExceeded> {
        if check(declared_total, self.budget) {
            Ok(())
        } else {
            Err(LimitExceeded::Expansion {
                extracted: declared_total,
                budget: self.budget,
            })
        }
    }

    /// Reserves a member slot.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded::MemberCount` once the member cap is reached.
    pub fn admit_member(&mut self) -> Result<(), LimitExceeded> {
        let count = self.members + 1;
        if count > self.max_members {
            return Err(LimitExceeded::MemberCount {
                count,
                max: self.max_members,
            });
        }
        self.members = count;
        Ok(())
    }

    /// Records bytes actually written for a member.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded::Expansion` if the running total passes the
    /// budget, or `IntegerOverflow` if it cannot be represented.
    pub fn record(&mut self, bytes: u64) -> Result<(), LimitExceeded> {
        let extracted = self
            .extracted
            .checked_add(bytes)
            .ok_or(LimitExceeded::IntegerOverflow)?;

        if !check(extracted, self.budget) {
            return Err(LimitExceeded::Expansion {
                extracted,
                budget: self.budget,
            });
        }

        self.extracted = extracted;
        Ok(())
    }

    /// Bytes that may still be extracted.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.budget.saturating_sub(self.extracted)
    }

    /// Bytes extracted so far.
    #[must_use]
    pub const fn extracted(&self) -> u64 {
        self.extracted
    }

    /// Total budget.
    #[must_use]
    pub const fn budget(&self) -> u64 {
        self.budget
    }
}

/// Sums declared sizes, failing on overflow.
///
/// # Errors
///
/// Returns `LimitExceeded::IntegerOverflow` if the sum does not fit in `u64`.
pub fn sum_declared<I: IntoIterator<Item = u64>>(sizes: I) -> Result<u64, LimitExceeded> {
    sizes.into_iter().try_fold(0u64, |acc, size| {
        acc.checked_add(size).ok_or(LimitExceeded::IntegerOverflow)
    })
}

//! Pagination planner.
//!
//! The provider rejects any request whose `page * size` reaches
//! [`PAGE_CEILING`]. A fetch plan greedily takes the largest allowed size on
//! each successive page until the requested record count is covered.

use serde::Serialize;

/// Provider ceiling on `page * size`.
pub const PAGE_CEILING: u64 = 9500;

/// Record cap used when the requested count is not positive.
pub const DEFAULT_RECORD_CAP: u64 = 10_000;

/// One scheduled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchUnit {
    /// Page number
    pub page: u32,
    /// Page size
    pub size: u32,
}

impl FetchUnit {
    /// Largest page size the provider accepts for `page`.
    #[must_use]
    pub fn max_size(page: u32) -> u64 {
        if page == 0 {
            return 0;
        }
        (PAGE_CEILING - 1) / u64::from(page)
    }
}

/// Ordered schedule of fetch units for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    requested: u64,
    units: Vec<FetchUnit>,
}

impl FetchPlan {
    /// Plan fetch units covering `requested` records.
    ///
    /// A non-positive `requested` falls back to [`DEFAULT_RECORD_CAP`]. Pages
    /// start at `starting_page` (page 0 is treated as page 1). When
    /// `max_requests` is set the schedule is truncated to that many units.
    #[must_use]
    pub fn new(requested: i64, starting_page: u32, max_requests: Option<u32>) -> Self {
        let requested = u64::try_from(requested)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_RECORD_CAP);

        let mut units = Vec::new();
        let mut remaining = requested;
        let mut page = starting_page.max(1);

        while remaining > 0 {
            if max_requests.is_some_and(|max| units.len() >= max as usize) {
                break;
            }

            let size = FetchUnit::max_size(page).min(remaining);
            if size == 0 {
                break;
            }

            // size <= PAGE_CEILING, so it always fits
            let size = u32::try_from(size).unwrap_or(u32::MAX);
            units.push(FetchUnit { page, size });
            remaining -= u64::from(size);

            let Some(next) = page.checked_add(1) else {
                break;
            };
            page = next;
        }

        tracing::debug!(
            requested,
            units = units.len(),
            planned = requested - remaining,
            "Planned fetch schedule"
        );

        Self { requested, units }
    }

    /// Record count the plan was built for, after defaulting.
    #[must_use]
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Scheduled units, in request order.
    #[must_use]
    pub fn units(&self) -> &[FetchUnit] {
        &self.units
    }

    /// Number of scheduled units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True when nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sum of all unit sizes.
    #[must_use]
    pub fn total_records(&self) -> u64 {
        self.units.iter().map(|u| u64::from(u.size)).sum()
    }
}

/// Crawl phase definitions for one marketplace run
///
/// The sitemap-based crawler walks
/// `Start → FetchSitemapIndex → FetchSitemapPages → FetchListingDetail → Done`;
/// the pagination-based crawler walks
/// `Start → FetchListingPage(1..n) → FetchListingDetail → Done`.
/// A fatal discovery failure jumps straight to `Done`.
use std::fmt;

/// Represents where a crawler currently is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Crawler constructed, nothing fetched yet
    Start,

    // ===== Sitemap-based discovery =====
    /// Fetching the root sitemap document
    FetchSitemapIndex,

    /// Fetching child sitemaps listed by the index
    FetchSitemapPages,

    // ===== Pagination-based discovery =====
    /// Fetching listing page `n` (1-based)
    FetchListingPage(u32),

    // ===== Shared =====
    /// Discovery complete; fetching per-listing detail pages
    FetchListingDetail,

    /// Run finished (successfully or after a fatal discovery failure)
    Done,
}

impl CrawlPhase {
    /// Returns true while listing references are still being discovered
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            Self::FetchSitemapIndex | Self::FetchSitemapPages | Self::FetchListingPage(_)
        )
    }

    /// Returns true once no further work will happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        match (*self, next) {
            (Start, FetchSitemapIndex) => true,
            (Start, FetchListingPage(1)) => true,
            (FetchSitemapIndex, FetchSitemapPages) => true,
            (FetchSitemapPages, FetchListingDetail) => true,
            (FetchListingPage(n), FetchListingPage(m)) => m == n + 1,
            (FetchListingPage(_), FetchListingDetail) => true,
            (FetchListingDetail, Done) => true,
            // Discovery may abort, and a run may end before discovery starts
            (from, Done) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> String {
        match self {
            Self::Start => "start".to_string(),
            Self::FetchSitemapIndex => "fetch_sitemap_index".to_string(),
            Self::FetchSitemapPages => "fetch_sitemap_pages".to_string(),
            Self::FetchListingPage(n) => format!("fetch_listing_page({})", n),
            Self::FetchListingDetail => "fetch_listing_detail".to_string(),
            Self::Done => "done".to_string(),
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Owns a crawler's current phase and enforces legal transitions
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: CrawlPhase,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: CrawlPhase::Start,
        }
    }

    pub fn current(&self) -> CrawlPhase {
        self.current
    }

    /// Moves to `next`
    ///
    /// Illegal transitions are logged and ignored, leaving the phase unchanged.
    ///
    /// # Returns
    ///
    /// * `true` - The transition was applied
    /// * `false` - The transition was illegal
    pub fn advance(&mut self, next: CrawlPhase) -> bool {
        if !self.current.can_transition_to(next) {
            tracing::warn!("Ignoring invalid phase transition {} -> {}", self.current, next);
            return false;
        }

        tracing::debug!("Phase {} -> {}", self.current, next);
        self.current = next;
        true
    }

    /// Moves to `Done` unless already there
    pub fn finish(&mut self) {
        if !self.current.is_terminal() {
            self.advance(CrawlPhase::Done);
        }
    }
}

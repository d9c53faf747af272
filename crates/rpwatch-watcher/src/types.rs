use std::fmt;

/// The newest item read from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    pub canonical_reference: String,
    /// 1-based index of the locator tier that produced the item.
    pub source_tier: usize,
}

/// Result of one watch cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// First observation recorded into empty state; no alert.
    Baseline(String),
    Unchanged,
    Changed(String),
    ExtractionEmpty(DiagnosticContext),
    NavigationBlocked(DiagnosticContext),
    Error(String),
}

impl CycleOutcome {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Baseline(_) => "baseline",
            Self::Unchanged => "unchanged",
            Self::Changed(_) => "changed",
            Self::ExtractionEmpty(_) => "extraction_empty",
            Self::NavigationBlocked(_) => "navigation_blocked",
            Self::Error(_) => "error",
        }
    }

    /// The reference this outcome records into state, if any.
    #[must_use]
    pub fn recorded_reference(&self) -> Option<&str> {
        match self {
            Self::Baseline(r) | Self::Changed(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline(r) => write!(f, "baseline recorded: {r}"),
            Self::Unchanged => f.write_str("no new repost"),
            Self::Changed(r) => write!(f, "new repost: {r}"),
            Self::ExtractionEmpty(ctx) | Self::NavigationBlocked(ctx) => {
                write!(f, "{}", ctx.reason)
            }
            Self::Error(message) => write!(f, "cycle error: {message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticReason {
    /// The page text matched a block/error keyword.
    BlockPage,
    /// No tab-selection heuristic could open the repost tab.
    TabNotFound,
    /// The tab opened but no item matched any locator tier.
    NoItems,
}

impl fmt::Display for DiagnosticReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BlockPage => "site returned a block or error page",
            Self::TabNotFound => "repost tab could not be opened",
            Self::NoItems => "no repost items found",
        })
    }
}

/// Page context attached to a failed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticContext {
    pub reason: DiagnosticReason,
    pub title: Option<String>,
    pub url: Option<String>,
    pub matched_keywords: Vec<String>,
    pub tab_attempts: Vec<TabAttempt>,
}

impl DiagnosticContext {
    #[must_use]
    pub fn new(reason: DiagnosticReason) -> Self {
        Self {
            reason,
            title: None,
            url: None,
            matched_keywords: Vec::new(),
            tab_attempts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabHeuristic {
    VisibleText,
    Role,
    Position,
}

impl fmt::Display for TabHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VisibleText => "text",
            Self::Role => "role",
            Self::Position => "position",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabAttemptResult {
    Clicked,
    NotFound,
    ClickFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabAttempt {
    pub heuristic: TabHeuristic,
    /// Label tried, or `#<index>` for positional attempts.
    pub target: String,
    pub result: TabAttemptResult,
}

impl fmt::Display for TabAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match &self.result {
            TabAttemptResult::Clicked => "clicked",
            TabAttemptResult::NotFound => "not found",
            TabAttemptResult::ClickFailed(_) => "click failed",
        };
        write!(f, "{}:{}={result}", self.heuristic, self.target)
    }
}

/// Every heuristic tried while opening the repost tab, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabSelection {
    pub attempts: Vec<TabAttempt>,
}

impl TabSelection {
    /// The attempt that opened the tab.
    #[must_use]
    pub fn selected(&self) -> Option<&TabAttempt> {
        self.attempts
            .iter()
            .find(|a| a.result == TabAttemptResult::Clicked)
    }

    #[must_use]
    pub fn summary(&self) -> String {
        if self.attempts.is_empty() {
            return "none".to_owned();
        }
        self.attempts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

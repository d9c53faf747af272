use crate::types::{CycleOutcome, DiagnosticContext, DiagnosticReason};

/// Classifies a fresh extraction against the stored reference.
///
/// An empty `current` is [`CycleOutcome::ExtractionEmpty`] whatever the
/// previous value; an absent `previous` is [`CycleOutcome::Baseline`].
#[must_use]
pub fn detect(previous: Option<&str>, current: Option<&str>) -> CycleOutcome {
    let Some(current) = current.filter(|c| !c.trim().is_empty()) else {
        return CycleOutcome::ExtractionEmpty(DiagnosticContext::new(DiagnosticReason::NoItems));
    };
    match previous {
        None => CycleOutcome::Baseline(current.to_owned()),
        Some(previous) if previous == current => CycleOutcome::Unchanged,
        Some(_) => CycleOutcome::Changed(current.to_owned()),
    }
}

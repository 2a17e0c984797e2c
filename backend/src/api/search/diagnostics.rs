//! Transition diagnostics.
//!
//! Observes a finished request and reports what it saw: empty results,
//! failures, omitted facets, the transitions a page offers and facet values
//! that break the enabled/count relationship. Nothing here changes what the
//! user receives. Every record is logged through `tracing` with a stable
//! `event` field and kept in [`Diagnostics`] for the caller.

use common::{
    Dimension,
    breadcrumbs::ActiveFilterChip,
    filter_state::FilterState,
    search_result::{FacetCollection, FacetOriginalValue, ResultPage},
    url_codec::{canonical_url, page_url},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    AddValue,
    RemoveValue,
    SetScalar,
    ClearScalar,
    NextPage,
    PrevPage,
}

impl TransitionAction {
    /// Actions that can never shrink the result set to nothing.
    pub fn always_permitted(self) -> bool {
        !matches!(self, TransitionAction::AddValue | TransitionAction::SetScalar)
    }

    fn adding(dimension: Dimension) -> Self {
        if dimension.is_multi_select() { TransitionAction::AddValue } else { TransitionAction::SetScalar }
    }

    fn removing(dimension: Dimension) -> Self {
        if dimension.is_multi_select() { TransitionAction::RemoveValue } else { TransitionAction::ClearScalar }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub action: TransitionAction,
    pub dimension: Option<Dimension>,
    pub value: Option<FacetOriginalValue>,
    pub label: String,
    /// Total the target page would show, when known.
    pub expected_count: Option<u64>,
    pub enabled: bool,
    pub target_url: String,
}

/// Every move available from one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionLog {
    pub state: FilterState,
    pub url: String,
    pub total: u64,
    pub filter_count: usize,
    pub transitions: Vec<Transition>,
}

impl TransitionLog {
    /// `removal_counts[i]` is the total after removing `chips[i]`.
    pub fn new(
        state: &FilterState,
        results: &ResultPage,
        facets: &FacetCollection,
        chips: &[ActiveFilterChip],
        removal_counts: &[Option<u64>],
    ) -> Self {
        let removal_count = |dimension: Dimension, value: &FacetOriginalValue| {
            chips
                .iter()
                .zip(removal_counts)
                .find(|(chip, _)| chip.dimension == dimension && &chip.value == value)
                .and_then(|(_, count)| *count)
        };

        let mut transitions: Vec<Transition> = facets
            .values()
            .map(|(facet, value)| Transition {
                action: if value.selected {
                    TransitionAction::removing(facet.dimension)
                } else {
                    TransitionAction::adding(facet.dimension)
                },
                dimension: Some(facet.dimension),
                value: Some(value.value.clone()),
                label: format!("{}: {}", facet.label, value.label),
                expected_count: if value.selected {
                    removal_count(facet.dimension, &value.value)
                } else {
                    Some(value.count)
                },
                enabled: value.enabled,
                target_url: value.url.clone(),
            })
            .collect();

        for (chip, count) in chips.iter().zip(removal_counts) {
            let offered = transitions
                .iter()
                .any(|t| t.dimension == Some(chip.dimension) && t.value.as_ref() == Some(&chip.value));
            if offered {
                continue;
            }
            transitions.push(Transition {
                action: TransitionAction::removing(chip.dimension),
                dimension: Some(chip.dimension),
                value: Some(chip.value.clone()),
                label: chip.label.clone(),
                expected_count: *count,
                enabled: true,
                target_url: chip.remove_url.clone(),
            });
        }

        let page = state.page_number();
        if page > 1 {
            transitions.push(Transition {
                action: TransitionAction::PrevPage,
                dimension: None,
                value: None,
                label: format!("Page {}", page - 1),
                expected_count: Some(results.total),
                enabled: true,
                target_url: page_url(state, page - 1),
            });
        }
        if results.has_more {
            transitions.push(Transition {
                action: TransitionAction::NextPage,
                dimension: None,
                value: None,
                label: format!("Page {}", page + 1),
                expected_count: Some(results.total),
                enabled: true,
                target_url: page_url(state, page + 1),
            });
        }

        Self {
            state: state.clone(),
            url: canonical_url(state),
            total: results.total,
            filter_count: state.active_filter_count(),
            transitions,
        }
    }

    pub fn enabled_count(&self) -> usize {
        self.transitions.iter().filter(|t| t.enabled).count()
    }

    pub fn disabled(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(|t| !t.enabled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedTransition {
    pub action: TransitionAction,
    pub dimension: Option<Dimension>,
    pub value: Option<FacetOriginalValue>,
}

/// Names the single action that leads from `prev` to `next`.
///
/// `None` when nothing changed or when the change touches more than one
/// value, which no single link on a page produces.
pub fn classify_transition(prev: &FilterState, next: &FilterState) -> Option<ClassifiedTransition> {
    let changed: Vec<Dimension> =
        Dimension::ALL.into_iter().filter(|d| prev.selected_values(*d) != next.selected_values(*d)).collect();

    let dimension = match changed.as_slice() {
        [] => {
            let action = match next.offset().cmp(&prev.offset()) {
                std::cmp::Ordering::Greater => TransitionAction::NextPage,
                std::cmp::Ordering::Less => TransitionAction::PrevPage,
                std::cmp::Ordering::Equal => return None,
            };
            return Some(ClassifiedTransition { action, dimension: None, value: None });
        }
        [dimension] => *dimension,
        _ => return None,
    };

    let before = prev.selected_values(dimension);
    let after = next.selected_values(dimension);
    let added: Vec<_> = after.iter().filter(|v| !before.contains(v)).cloned().collect();
    let removed: Vec<_> = before.iter().filter(|v| !after.contains(v)).cloned().collect();

    let (action, value) = if dimension.is_multi_select() {
        match (added.as_slice(), removed.as_slice()) {
            ([value], []) => (TransitionAction::AddValue, value.clone()),
            ([], [value]) => (TransitionAction::RemoveValue, value.clone()),
            _ => return None,
        }
    } else {
        match (added.into_iter().next(), removed.into_iter().next()) {
            (Some(value), _) => (TransitionAction::SetScalar, value),
            (None, Some(value)) => (TransitionAction::ClearScalar, value),
            (None, None) => return None,
        }
    };
    Some(ClassifiedTransition { action, dimension: Some(dimension), value: Some(value) })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Permitted,
    /// The previous page advertised the target with a zero count.
    Blocked,
    /// The previous page did not offer the target at all.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionCheck {
    pub transition: Option<ClassifiedTransition>,
    pub expected_count: Option<u64>,
    pub verdict: Verdict,
}

/// Checks a move against the facets shown on the page it started from.
pub fn validate_transition(prev_state: &FilterState, next_state: &FilterState, prev_facets: &FacetCollection) -> TransitionCheck {
    let Some(transition) = classify_transition(prev_state, next_state) else {
        let verdict = if prev_state == next_state { Verdict::Permitted } else { Verdict::Unknown };
        return TransitionCheck { transition: None, expected_count: None, verdict };
    };
    if transition.action.always_permitted() {
        return TransitionCheck { transition: Some(transition), expected_count: None, verdict: Verdict::Permitted };
    }

    let offered = transition
        .dimension
        .zip(transition.value.as_ref())
        .and_then(|(dimension, value)| prev_facets.facet(dimension)?.value(value));
    let (expected_count, verdict) = match offered {
        Some(value) if value.count > 0 => (Some(value.count), Verdict::Permitted),
        Some(value) => (Some(value.count), Verdict::Blocked),
        None => (None, Verdict::Unknown),
    };
    TransitionCheck { transition: Some(transition), expected_count, verdict }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticRecord {
    NoResults { path: String, query: String, state: FilterState },
    ParseFailed { path: String, query: String, error: String },
    ExecutionFailed { path: String, query: String, state: FilterState, error: String },
    FacetOmitted { dimension: Dimension, error: String },
    /// Every move the page offers, with the total each would yield.
    Transitions {
        url: String,
        total: u64,
        enabled: usize,
        disabled: usize,
        disabled_values: Vec<String>,
        transitions: Vec<Transition>,
    },
    RemovalCountFailed { dimension: Dimension, value: FacetOriginalValue, error: String },
    SuspiciousZeroResult { path: String, query: String, previous_total: u64, threshold: u64 },
    FacetInvariantViolated {
        dimension: Dimension,
        value: FacetOriginalValue,
        count: u64,
        selected: bool,
        enabled: bool,
    },
}

impl DiagnosticRecord {
    pub fn event(&self) -> &'static str {
        match self {
            DiagnosticRecord::NoResults { .. } => "no_results",
            DiagnosticRecord::ParseFailed { .. } => "parse_failed",
            DiagnosticRecord::ExecutionFailed { .. } => "execution_failed",
            DiagnosticRecord::FacetOmitted { .. } => "facet_omitted",
            DiagnosticRecord::Transitions { .. } => "transitions",
            DiagnosticRecord::RemovalCountFailed { .. } => "removal_count_failed",
            DiagnosticRecord::SuspiciousZeroResult { .. } => "suspicious_zero_result",
            DiagnosticRecord::FacetInvariantViolated { .. } => "facet_invariant_violated",
        }
    }

    pub fn transitions(log: &TransitionLog) -> Self {
        DiagnosticRecord::Transitions {
            url: log.url.clone(),
            total: log.total,
            enabled: log.enabled_count(),
            disabled: log.transitions.len() - log.enabled_count(),
            disabled_values: log
                .disabled()
                .map(|t| match (t.dimension, &t.value) {
                    (Some(dimension), Some(value)) => format!("{}:{}", dimension.id(), value),
                    _ => t.label.clone(),
                })
                .collect(),
            transitions: log.transitions.clone(),
        }
    }

    fn emit(&self) {
        let event = self.event();
        match self {
            DiagnosticRecord::NoResults { path, query, state } => {
                tracing::info!(event, path = %path, query = %query, state = %state_json(state), "no results");
            }
            DiagnosticRecord::ParseFailed { path, query, error } => {
                tracing::warn!(event, path = %path, query = %query, error = %error, "could not decode navigation address");
            }
            DiagnosticRecord::ExecutionFailed { path, query, state, error } => {
                tracing::error!(event, path = %path, query = %query, state = %state_json(state), error = %error, "result query failed");
            }
            DiagnosticRecord::FacetOmitted { dimension, error } => {
                tracing::warn!(event, dimension = dimension.id(), error = %error, "facet omitted");
            }
            DiagnosticRecord::Transitions { url, total, enabled, disabled, disabled_values, transitions } => {
                tracing::debug!(event, url = %url, total, enabled, disabled, disabled_values = ?disabled_values, "transitions");
                tracing::trace!(
                    event,
                    url = %url,
                    transitions = %serde_json::to_string(transitions).unwrap_or_default(),
                    "transition list"
                );
            }
            DiagnosticRecord::RemovalCountFailed { dimension, value, error } => {
                tracing::warn!(event, dimension = dimension.id(), value = %value, error = %error, "removal count failed");
            }
            DiagnosticRecord::SuspiciousZeroResult { path, query, previous_total, threshold } => {
                tracing::warn!(event, path = %path, query = %query, previous_total, threshold, "result set collapsed to zero");
            }
            DiagnosticRecord::FacetInvariantViolated { dimension, value, count, selected, enabled } => {
                tracing::warn!(
                    event,
                    dimension = dimension.id(),
                    value = %value,
                    count,
                    selected,
                    enabled,
                    "facet value state is inconsistent"
                );
            }
        }
    }
}

fn state_json(state: &FilterState) -> String {
    serde_json::to_string(state).unwrap_or_default()
}

/// Records for one request, in the order they were raised.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<DiagnosticRecord>,
}

impl Diagnostics {
    pub fn record(&mut self, record: DiagnosticRecord) {
        record.emit();
        self.records.push(record);
    }

    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DiagnosticRecord> {
        self.records
    }
}

/// Values that are enabled with nothing behind them, or selected yet
/// rendered inert.
pub fn check_facet_invariants(facets: &FacetCollection) -> Vec<DiagnosticRecord> {
    facets
        .values()
        .filter(|(_, v)| (v.enabled && v.count == 0 && !v.selected) || (v.selected && !v.enabled))
        .map(|(facet, v)| DiagnosticRecord::FacetInvariantViolated {
            dimension: facet.dimension,
            value: v.value.clone(),
            count: v.count,
            selected: v.selected,
            enabled: v.enabled,
        })
        .collect()
}

pub fn check_suspicious_zero_result(
    path: &str,
    query: &str,
    total: u64,
    previous_total: Option<u64>,
    threshold: u64,
) -> Option<DiagnosticRecord> {
    let previous_total = previous_total?;
    (total == 0 && previous_total >= threshold).then(|| DiagnosticRecord::SuspiciousZeroResult {
        path: path.to_string(),
        query: query.to_string(),
        previous_total,
        threshold,
    })
}

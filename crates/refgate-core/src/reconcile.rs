//! Reconciliation: classify every planned reference as found or missing.
//!
//! One query per plan. The fast path compares the org's total count against
//! the plan's expected count; on a match, every reference in scope is
//! confirmed without inspecting individual names. On a mismatch the slow
//! path tests each query key against the returned name set. Composite plans
//! are already scoped to a single parent, so child membership under that
//! plan is the composite comparison.
//!
//! Count equality does not strictly prove identical identity; the gap is a
//! documented trade-off, and the query log records expected vs. total so a
//! suspicious run can be inspected after the fact.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::category::Category;
use crate::error::GateError;
use crate::plan::{QueryMode, QueryPlan};
use crate::transport::QueryTransport;

// ============================================================================
// Types
// ============================================================================

/// Classification of one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The reference exists in the target org.
    Found,
    /// The reference could not be confirmed.
    NotFound,
}

/// Final classification of one original reference. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Category the reference belongs to.
    pub category: Category,
    /// The reference as extracted (pre-stripping).
    pub reference: String,
    /// Found or not found.
    pub outcome: Outcome,
}

/// Record of one executed query, kept for the query log artifact.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRecord {
    /// Category the query verified.
    pub category: Category,
    /// Target entity.
    pub entity: String,
    /// Query mode used.
    pub mode: QueryMode,
    /// The SOQL sent to the transport.
    pub soql: String,
    /// References the plan expected to confirm.
    pub expected: usize,
    /// Total the org reported.
    pub total: usize,
    /// Names the org returned.
    pub returned: Vec<String>,
    /// ISO-8601 execution timestamp.
    pub executed_at: String,
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Execute one plan and classify every reference in its scope.
pub fn reconcile_plan(
    plan: &QueryPlan,
    transport: &dyn QueryTransport,
) -> Result<(Vec<Verdict>, QueryRecord), GateError> {
    let soql = plan.soql();
    let result = transport
        .run(&soql, plan.mode, plan.name_field)
        .map_err(|e| GateError::query_failed(plan.entity, e))?;

    let expected = plan.expected();
    let verdicts = if result.total == expected {
        // Fast path: counts agree, confirm the whole scope.
        debug!(
            category = %plan.category,
            expected,
            "fast path: count match, all confirmed"
        );
        plan.values
            .iter()
            .map(|v| Verdict {
                category: plan.category,
                reference: v.original.clone(),
                outcome: Outcome::Found,
            })
            .collect()
    } else {
        // Slow path: per-item membership against the returned name set,
        // compared by the same query key the planner built.
        debug!(
            category = %plan.category,
            expected,
            total = result.total,
            "slow path: count mismatch, checking membership"
        );
        let returned: HashSet<&str> = result.names.iter().map(String::as_str).collect();
        plan.values
            .iter()
            .map(|v| Verdict {
                category: plan.category,
                reference: v.original.clone(),
                outcome: if returned.contains(v.query_key.as_str()) {
                    Outcome::Found
                } else {
                    Outcome::NotFound
                },
            })
            .collect()
    };

    let record = QueryRecord {
        category: plan.category,
        entity: plan.entity.to_string(),
        mode: plan.mode,
        soql,
        expected,
        total: result.total,
        returned: result.names,
        executed_at: chrono::Utc::now().to_rfc3339(),
    };

    Ok((verdicts, record))
}

/// Execute every plan in order, accumulating verdicts and query records.
///
/// Strictly sequential: each query blocks until the transport returns, and
/// a failure aborts immediately, discarding verdicts collected so far.
pub fn reconcile_all(
    plans: &[QueryPlan],
    transport: &dyn QueryTransport,
) -> Result<(Vec<Verdict>, Vec<QueryRecord>), GateError> {
    let mut verdicts = Vec::new();
    let mut records = Vec::new();
    for plan in plans {
        let (plan_verdicts, record) = reconcile_plan(plan, transport)?;
        verdicts.extend(plan_verdicts);
        records.push(record);
    }
    Ok((verdicts, records))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::plan_category;
    use crate::transport::ScriptedTransport;

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    mod fast_path {
        use super::*;

        #[test]
        fn count_match_confirms_without_inspecting_names() {
            let plans =
                plan_category(Category::Tab, &values(&["Account", "Contact"])).unwrap();
            // Irrelevant name list: the fast path must not look at it.
            let transport = ScriptedTransport::new().respond(2, &[]);
            let (verdicts, record) = reconcile_plan(&plans[0], &transport).unwrap();
            assert!(verdicts.iter().all(|v| v.outcome == Outcome::Found));
            assert_eq!(record.expected, 2);
            assert_eq!(record.total, 2);
        }
    }

    mod slow_path {
        use super::*;

        #[test]
        fn membership_decides_on_count_mismatch() {
            let plans = plan_category(
                Category::Profile,
                &values(&["System Administrator", "Sales User", "Ghost Profile"]),
            )
            .unwrap();
            let transport =
                ScriptedTransport::new().respond(2, &["System Administrator", "Sales User"]);
            let (verdicts, _) = reconcile_plan(&plans[0], &transport).unwrap();
            assert_eq!(verdicts[0].outcome, Outcome::Found);
            assert_eq!(verdicts[1].outcome, Outcome::Found);
            assert_eq!(verdicts[2].outcome, Outcome::NotFound);
            assert_eq!(verdicts[2].reference, "Ghost Profile");
        }

        #[test]
        fn comparison_uses_the_stripped_query_key() {
            let plans =
                plan_category(Category::Object, &values(&["Invoice__c", "Order__c"])).unwrap();
            // Org knows Invoice only; names come back without the suffix.
            let transport = ScriptedTransport::new().respond(1, &["Invoice"]);
            let (verdicts, _) = reconcile_plan(&plans[0], &transport).unwrap();
            assert_eq!(verdicts[0].reference, "Invoice__c");
            assert_eq!(verdicts[0].outcome, Outcome::Found);
            assert_eq!(verdicts[1].reference, "Order__c");
            assert_eq!(verdicts[1].outcome, Outcome::NotFound);
        }

        #[test]
        fn missing_composite_child_reports_the_original_value() {
            let plans =
                plan_category(Category::Field, &values(&["Account.Custom_Field__c"])).unwrap();
            let transport = ScriptedTransport::new().respond(0, &[]);
            let (verdicts, _) = reconcile_plan(&plans[0], &transport).unwrap();
            assert_eq!(verdicts[0].outcome, Outcome::NotFound);
            assert_eq!(verdicts[0].reference, "Account.Custom_Field__c");
        }
    }

    mod sequencing {
        use super::*;

        #[test]
        fn one_query_per_plan_in_order() {
            let mut plans =
                plan_category(Category::RecordType, &values(&["Account.A", "Case.B"])).unwrap();
            plans.extend(plan_category(Category::Tab, &values(&["Account"])).unwrap());
            let transport = ScriptedTransport::new()
                .respond(1, &["A"])
                .respond(1, &["B"])
                .respond(1, &["Account"]);
            let (verdicts, records) = reconcile_all(&plans, &transport).unwrap();
            assert_eq!(verdicts.len(), 3);
            assert_eq!(records.len(), 3);
            let executed = transport.executed();
            assert_eq!(executed.len(), 3);
            assert!(executed[0].contains("SobjectType = 'Account'"));
            assert!(executed[1].contains("SobjectType = 'Case'"));
            assert!(executed[2].contains("TabDefinition"));
        }

        #[test]
        fn transport_failure_aborts_the_run() {
            let plans = plan_category(Category::Tab, &values(&["Account"])).unwrap();
            let transport = ScriptedTransport::new(); // no scripted response
            let err = reconcile_all(&plans, &transport).unwrap_err();
            assert!(matches!(err, GateError::QueryFailed { .. }));
            assert_eq!(err.error_code().code(), 4);
        }
    }
}

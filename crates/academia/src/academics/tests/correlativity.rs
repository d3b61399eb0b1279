use super::common::*;
use crate::academics::correlativity::{RuleChangeSet, RuleViolation};
use crate::academics::domain::{Action, Requirement, RuleSpec, SpaceId};
use crate::academics::events::DomainEvent;
use crate::academics::repository::{CorrelativityStore, RepositoryError};
use crate::academics::service::{AcademicServiceError, SyncSummary};

fn spec(action: Action, requirement: Requirement, prerequisite: SpaceId) -> RuleSpec {
    RuleSpec {
        action,
        requirement,
        prerequisite,
    }
}

#[test]
fn synchronize_is_idempotent() {
    let campus = campus();
    let desired = vec![
        spec(Action::TakeCourse, Requirement::Regularized, campus.history.id),
        spec(Action::SitFinal, Requirement::Approved, campus.history.id),
    ];

    let first = campus
        .service
        .synchronize(campus.plan.id, campus.didactics.id, desired.clone())
        .expect("first sync");
    assert_eq!(
        first,
        SyncSummary {
            inserted: 2,
            deleted: 0
        }
    );

    let second = campus
        .service
        .synchronize(campus.plan.id, campus.didactics.id, desired)
        .expect("second sync");
    assert_eq!(
        second,
        SyncSummary {
            inserted: 0,
            deleted: 0
        }
    );

    let synchronized = campus
        .activity
        .events()
        .into_iter()
        .filter(|event| matches!(event, DomainEvent::RulesSynchronized { .. }))
        .count();
    assert_eq!(synchronized, 1);
}

#[test]
fn synchronize_replaces_the_rule_set_by_difference() {
    let campus = campus();
    campus
        .service
        .synchronize(
            campus.plan.id,
            campus.practicum.id,
            vec![
                spec(Action::TakeCourse, Requirement::Approved, campus.workshop.id),
                spec(Action::TakeCourse, Requirement::Regularized, campus.history.id),
            ],
        )
        .expect("initial rules");
    let kept = campus
        .service
        .get_rules(campus.plan.id, campus.practicum.id, None)
        .expect("rules readable")[0]
        .clone();

    let summary = campus
        .service
        .synchronize(
            campus.plan.id,
            campus.practicum.id,
            vec![
                spec(Action::TakeCourse, Requirement::Approved, campus.workshop.id),
                spec(Action::SitFinal, Requirement::Approved, campus.didactics.id),
            ],
        )
        .expect("replacement rules");
    assert_eq!(
        summary,
        SyncSummary {
            inserted: 1,
            deleted: 1
        }
    );

    let rules = campus
        .service
        .get_rules(campus.plan.id, campus.practicum.id, None)
        .expect("rules readable");
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0], kept);
    assert_eq!(
        rules[1].spec(),
        spec(Action::SitFinal, Requirement::Approved, campus.didactics.id)
    );

    let course_rules = campus
        .service
        .get_rules(campus.plan.id, campus.practicum.id, Some(Action::TakeCourse))
        .expect("rules readable");
    assert_eq!(course_rules, vec![kept]);
}

#[test]
fn empty_desired_set_clears_the_space() {
    let campus = campus();
    campus.require(
        &campus.didactics,
        Action::TakeCourse,
        Requirement::Approved,
        &campus.workshop,
    );

    let summary = campus
        .service
        .synchronize(campus.plan.id, campus.didactics.id, Vec::new())
        .expect("rules cleared");
    assert_eq!(summary.deleted, 1);
    assert!(campus
        .store
        .space_rules(campus.plan.id, campus.didactics.id)
        .expect("rules readable")
        .is_empty());
}

#[test]
fn self_reference_is_rejected_and_rules_stay_intact() {
    let campus = campus();
    campus.require(
        &campus.didactics,
        Action::TakeCourse,
        Requirement::Approved,
        &campus.workshop,
    );
    let before = campus
        .store
        .space_rules(campus.plan.id, campus.didactics.id)
        .expect("rules readable");

    let err = campus
        .service
        .synchronize(
            campus.plan.id,
            campus.didactics.id,
            vec![spec(
                Action::TakeCourse,
                Requirement::Approved,
                campus.didactics.id,
            )],
        )
        .expect_err("self reference rejected");
    assert!(matches!(
        err,
        AcademicServiceError::Rule(RuleViolation::SelfReference { .. })
    ));

    let after = campus
        .store
        .space_rules(campus.plan.id, campus.didactics.id)
        .expect("rules readable");
    assert_eq!(before, after);
}

#[test]
fn prerequisite_from_another_plan_is_rejected() {
    let campus = campus();
    let foreign = campus.foreign_space();

    let err = campus
        .service
        .synchronize(
            campus.plan.id,
            campus.didactics.id,
            vec![spec(Action::TakeCourse, Requirement::Approved, foreign.id)],
        )
        .expect_err("foreign prerequisite rejected");
    assert!(matches!(
        err,
        AcademicServiceError::Rule(RuleViolation::ForeignPrerequisite { .. })
    ));
}

#[test]
fn rules_closing_a_cycle_are_rejected() {
    let campus = campus();
    campus.require(
        &campus.didactics,
        Action::TakeCourse,
        Requirement::Regularized,
        &campus.history,
    );
    campus.require(
        &campus.practicum,
        Action::TakeCourse,
        Requirement::Approved,
        &campus.didactics,
    );

    let err = campus
        .service
        .synchronize(
            campus.plan.id,
            campus.history.id,
            vec![spec(Action::SitFinal, Requirement::Approved, campus.practicum.id)],
        )
        .expect_err("cycle rejected");
    assert!(matches!(
        err,
        AcademicServiceError::Rule(RuleViolation::Cycle { .. })
    ));
    assert!(campus
        .store
        .space_rules(campus.plan.id, campus.history.id)
        .expect("rules readable")
        .is_empty());
}

#[test]
fn dependents_are_listed_from_the_plan_graph() {
    let campus = campus();
    campus.require(
        &campus.didactics,
        Action::TakeCourse,
        Requirement::Regularized,
        &campus.history,
    );
    campus.require(
        &campus.practicum,
        Action::SitFinal,
        Requirement::Approved,
        &campus.history,
    );

    let plan = campus
        .service
        .plan_snapshot(campus.plan.id)
        .expect("plan loads");
    let dependents: Vec<_> = plan
        .graph
        .dependents_of(campus.history.id)
        .into_iter()
        .collect();
    assert_eq!(dependents, vec![campus.didactics.id, campus.practicum.id]);
}

#[test]
fn change_set_computed_before_a_concurrent_edit_is_rejected() {
    let campus = campus();
    let stale = campus
        .service
        .plan_snapshot(campus.plan.id)
        .expect("plan loads");
    let desired = vec![spec(Action::TakeCourse, Requirement::Approved, campus.practicum.id)];
    stale
        .graph
        .check_desired(campus.didactics.id, &desired, &stale.spaces)
        .expect("acyclic against the stale graph");
    let changes = RuleChangeSet::diff(&[], &desired);

    campus.require(
        &campus.practicum,
        Action::TakeCourse,
        Requirement::Approved,
        &campus.didactics,
    );

    let err = campus
        .store
        .apply_changes(
            campus.plan.id,
            campus.didactics.id,
            &stale.graph.rule_ids(),
            &changes,
        )
        .expect_err("stale change set rejected");
    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert!(campus
        .store
        .space_rules(campus.plan.id, campus.didactics.id)
        .expect("rules readable")
        .is_empty());

    let current = campus
        .service
        .plan_snapshot(campus.plan.id)
        .expect("plan loads");
    let applied = campus
        .store
        .apply_changes(
            campus.plan.id,
            campus.history.id,
            &current.graph.rule_ids(),
            &RuleChangeSet::diff(
                &[],
                &[spec(Action::SitFinal, Requirement::Approved, campus.workshop.id)],
            ),
        )
        .expect("fresh change set applies");
    assert_eq!(applied.len(), 1);
}

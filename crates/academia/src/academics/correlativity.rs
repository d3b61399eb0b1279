//! Prerequisite ("correlatividad") graph of a study plan and the set-difference
//! reconciliation used when an administrator edits the rules of one space.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use super::domain::{Action, CorrelativityRule, CurricularSpace, PlanId, RuleId, RuleSpec, SpaceId};

/// Rules of a single plan, kept in definition order.
#[derive(Debug, Clone, Default)]
pub struct CorrelativityGraph {
    plan_id: PlanId,
    rules: Vec<CorrelativityRule>,
}

impl CorrelativityGraph {
    pub fn from_rules(plan_id: PlanId, rules: Vec<CorrelativityRule>) -> Self {
        let mut rules: Vec<_> = rules
            .into_iter()
            .filter(|rule| rule.plan_id == plan_id)
            .collect();
        rules.sort_by_key(|rule| rule.id);
        Self { plan_id, rules }
    }

    pub fn plan_id(&self) -> PlanId {
        self.plan_id
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get_rules(&self, space: SpaceId, action: Action) -> Vec<&CorrelativityRule> {
        self.rules
            .iter()
            .filter(|rule| rule.space_id == space && rule.action == action)
            .collect()
    }

    /// Ids of every rule of the plan, ascending.
    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|rule| rule.id).collect()
    }

    pub fn rules_of(&self, space: SpaceId) -> Vec<&CorrelativityRule> {
        self.rules
            .iter()
            .filter(|rule| rule.space_id == space)
            .collect()
    }

    /// Spaces that list `prerequisite` in any of their rules.
    pub fn dependents_of(&self, prerequisite: SpaceId) -> BTreeSet<SpaceId> {
        self.rules
            .iter()
            .filter(|rule| rule.prerequisite == prerequisite)
            .map(|rule| rule.space_id)
            .collect()
    }

    /// Checks a desired rule set for `space` against the rest of the plan.
    pub fn check_desired(
        &self,
        space: SpaceId,
        desired: &[RuleSpec],
        plan_spaces: &BTreeMap<SpaceId, CurricularSpace>,
    ) -> Result<(), RuleViolation> {
        if !plan_spaces.contains_key(&space) {
            return Err(RuleViolation::SpaceOutsidePlan {
                space,
                plan: self.plan_id,
            });
        }

        for spec in desired {
            if spec.prerequisite == space {
                return Err(RuleViolation::SelfReference { space });
            }
            if !plan_spaces.contains_key(&spec.prerequisite) {
                return Err(RuleViolation::ForeignPrerequisite {
                    prerequisite: spec.prerequisite,
                    plan: self.plan_id,
                });
            }
        }

        let mut edges: BTreeMap<SpaceId, BTreeSet<SpaceId>> = BTreeMap::new();
        for rule in self.rules.iter().filter(|rule| rule.space_id != space) {
            edges
                .entry(rule.space_id)
                .or_default()
                .insert(rule.prerequisite);
        }

        for spec in desired {
            if reaches(&edges, spec.prerequisite, space) {
                return Err(RuleViolation::Cycle {
                    space,
                    prerequisite: spec.prerequisite,
                });
            }
        }

        Ok(())
    }
}

fn reaches(edges: &BTreeMap<SpaceId, BTreeSet<SpaceId>>, from: SpaceId, target: SpaceId) -> bool {
    let mut stack = vec![from];
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(next) = edges.get(&current) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

/// Inserts and deletes needed to turn the stored rules of one space into the desired set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleChangeSet {
    pub inserts: Vec<RuleSpec>,
    pub deletes: Vec<RuleId>,
}

impl RuleChangeSet {
    /// `desired - existing` to insert (in the order given) and `existing - desired`
    /// to delete. Duplicate desired entries collapse to one.
    pub fn diff(existing: &[CorrelativityRule], desired: &[RuleSpec]) -> Self {
        let have: BTreeSet<RuleSpec> = existing.iter().map(CorrelativityRule::spec).collect();
        let mut want = BTreeSet::new();

        let inserts = desired
            .iter()
            .copied()
            .filter(|spec| want.insert(*spec))
            .filter(|spec| !have.contains(spec))
            .collect();

        let deletes = existing
            .iter()
            .filter(|rule| !want.contains(&rule.spec()))
            .map(|rule| rule.id)
            .collect();

        Self { inserts, deletes }
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.deletes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("space {space} does not belong to plan {plan}")]
    SpaceOutsidePlan { space: SpaceId, plan: PlanId },
    #[error("space {space} cannot be its own prerequisite")]
    SelfReference { space: SpaceId },
    #[error("prerequisite {prerequisite} is not a space of plan {plan}")]
    ForeignPrerequisite { prerequisite: SpaceId, plan: PlanId },
    #[error("requiring {prerequisite} for space {space} would create a prerequisite cycle")]
    Cycle {
        space: SpaceId,
        prerequisite: SpaceId,
    },
}

//! Plan - ordered Effects produced by the differ
//!
//! Building a plan never touches the remote system.

use std::fmt;

use crate::effect::Effect;

#[derive(Debug, Clone, Default)]
pub struct Plan {
    effects: Vec<Effect>,
}

impl Plan {
    pub fn new() -> Self {
        Plan::default()
    }

    pub fn add(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// True when nothing would change on apply
    pub fn is_empty(&self) -> bool {
        !self.effects.iter().any(Effect::is_mutating)
    }

    pub fn summary(&self) -> PlanSummary {
        self.effects
            .iter()
            .fold(PlanSummary::default(), |mut summary, effect| {
                match effect {
                    Effect::Read(_) => {}
                    Effect::Create(_) => summary.create += 1,
                    Effect::Update { .. } => summary.update += 1,
                    Effect::Replace { .. } => summary.replace += 1,
                    Effect::Delete { .. } => summary.delete += 1,
                }
                summary
            })
    }
}

impl FromIterator<Effect> for Plan {
    fn from_iter<I: IntoIterator<Item = Effect>>(iter: I) -> Self {
        Plan {
            effects: iter.into_iter().collect(),
        }
    }
}

/// Counts of mutating effects, by kind
#[derive(Debug, Default, PartialEq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
}

impl PlanSummary {
    /// Existing resources that apply would remove, including replaced ones
    pub fn destroyed(&self) -> usize {
        self.replace + self.delete
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Plan: {} to create, {} to update, {} to replace, {} to delete",
            self.create, self.update, self.replace, self.delete
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Resource, ResourceId, State};

    #[test]
    fn reads_alone_leave_plan_empty() {
        let plan: Plan = [Effect::Read(ResourceId::new("source", "a"))]
            .into_iter()
            .collect();
        assert!(plan.is_empty());
        assert_eq!(plan.summary(), PlanSummary::default());
    }

    #[test]
    fn summary_counts_each_kind() {
        let replaced = ResourceId::new("source", "c");
        let plan: Plan = vec![
            Effect::Create(Resource::new("source", "a")),
            Effect::Create(Resource::new("source", "b")),
            Effect::Replace {
                id: replaced.clone(),
                from: State::not_found(replaced),
                to: Resource::new("source", "c"),
                reasons: vec!["variant_name".to_string()],
            },
            Effect::Delete {
                id: ResourceId::new("source", "d"),
                identifier: "id-d".to_string(),
            },
        ]
        .into_iter()
        .collect();

        let summary = plan.summary();
        assert!(!plan.is_empty());
        assert_eq!(summary.create, 2);
        assert_eq!(summary.destroyed(), 2);
        assert_eq!(
            summary.to_string(),
            "Plan: 2 to create, 0 to update, 1 to replace, 1 to delete"
        );
    }
}

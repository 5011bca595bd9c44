//! Tagged relations contributed by components.
//!
//! A relation is a label plus a predicate over the namespace. Predicates are
//! plain function pointers: they capture nothing and read every variable and
//! parameter through named lookups on the [`ModelNamespace`], so the inputs of
//! each relation are always traceable to a declaration.
//!
//! Evaluating a predicate yields the residual `lhs - rhs` of the equality it
//! encodes, or [`Evaluation::Skip`] when the relation does not apply at that
//! point (for example a recursion at `t = 0`).

use crate::errors::{RSIAMError, RSIAMResult};
use crate::namespace::ModelNamespace;
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type GlobalPredicate = fn(&ModelNamespace, usize) -> RSIAMResult<Evaluation>;
pub type GlobalInitPredicate = fn(&ModelNamespace) -> RSIAMResult<Evaluation>;
pub type RegionalPredicate = fn(&ModelNamespace, usize, usize) -> RSIAMResult<Evaluation>;
pub type RegionalInitPredicate = fn(&ModelNamespace, usize) -> RSIAMResult<Evaluation>;

/// Outcome of evaluating a relation at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Residual `lhs - rhs`; the relation holds when this is zero
    Residual(FloatValue),
    /// The relation does not apply at this point
    Skip,
}

impl Evaluation {
    pub fn equals(lhs: FloatValue, rhs: FloatValue) -> Self {
        Evaluation::Residual(lhs - rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    GlobalConstraint,
    GlobalInitConstraint,
    RegionalConstraint,
    RegionalInitConstraint,
}

#[derive(Clone, Copy)]
enum Predicate {
    Global(GlobalPredicate),
    GlobalInit(GlobalInitPredicate),
    Regional(RegionalPredicate),
    RegionalInit(RegionalInitPredicate),
}

/// Where a relation was evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub t: usize,
    pub region: Option<usize>,
}

#[derive(Clone)]
pub struct Relation {
    label: String,
    predicate: Predicate,
}

impl Relation {
    /// Holds for every time step
    pub fn global(label: &str, predicate: GlobalPredicate) -> Self {
        Self::new(label, Predicate::Global(predicate))
    }

    /// Holds at `t = 0` only
    pub fn global_init(label: &str, predicate: GlobalInitPredicate) -> Self {
        Self::new(label, Predicate::GlobalInit(predicate))
    }

    /// Holds for every time step and region
    pub fn regional(label: &str, predicate: RegionalPredicate) -> Self {
        Self::new(label, Predicate::Regional(predicate))
    }

    /// Holds for every region at `t = 0`
    pub fn regional_init(label: &str, predicate: RegionalInitPredicate) -> Self {
        Self::new(label, Predicate::RegionalInit(predicate))
    }

    fn new(label: &str, predicate: Predicate) -> Self {
        Self {
            label: label.to_string(),
            predicate,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> RelationKind {
        match self.predicate {
            Predicate::Global(_) => RelationKind::GlobalConstraint,
            Predicate::GlobalInit(_) => RelationKind::GlobalInitConstraint,
            Predicate::Regional(_) => RelationKind::RegionalConstraint,
            Predicate::RegionalInit(_) => RelationKind::RegionalInitConstraint,
        }
    }

    /// The points this relation must hold at.
    pub fn points(&self, namespace: &ModelNamespace) -> Vec<Point> {
        let n_steps = namespace.n_steps();
        let n_regions = namespace.n_regions();
        match self.predicate {
            Predicate::Global(_) => (0..n_steps).map(|t| Point { t, region: None }).collect(),
            Predicate::GlobalInit(_) => vec![Point { t: 0, region: None }],
            Predicate::Regional(_) => (0..n_steps)
                .flat_map(|t| {
                    (0..n_regions).map(move |r| Point {
                        t,
                        region: Some(r),
                    })
                })
                .collect(),
            Predicate::RegionalInit(_) => (0..n_regions)
                .map(|r| Point {
                    t: 0,
                    region: Some(r),
                })
                .collect(),
        }
    }

    /// Evaluate at a single point.
    ///
    /// Regional relations require `point.region`; it is ignored for global ones.
    pub fn evaluate(&self, namespace: &ModelNamespace, point: Point) -> RSIAMResult<Evaluation> {
        let region = || {
            point.region.ok_or_else(|| RSIAMError::IndexMismatch {
                name: self.label.clone(),
                declared: "(t, r)".to_string(),
                requested: format!("(t={}) without a region", point.t),
            })
        };
        match self.predicate {
            Predicate::Global(f) => f(namespace, point.t),
            Predicate::GlobalInit(f) => f(namespace),
            Predicate::Regional(f) => f(namespace, point.t, region()?),
            Predicate::RegionalInit(f) => f(namespace, region()?),
        }
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("label", &self.label)
            .field("kind", &self.kind())
            .finish()
    }
}

/// The relations contributed by one component, grouped by kind.
///
/// Iteration yields global, global-init, regional and regional-init relations
/// in that order, each in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct RelationSet {
    pub global: Vec<Relation>,
    pub global_init: Vec<Relation>,
    pub regional: Vec<Relation>,
    pub regional_init: Vec<Relation>,
}

impl RelationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, relation: Relation) {
        match relation.kind() {
            RelationKind::GlobalConstraint => self.global.push(relation),
            RelationKind::GlobalInitConstraint => self.global_init.push(relation),
            RelationKind::RegionalConstraint => self.regional.push(relation),
            RelationKind::RegionalInitConstraint => self.regional_init.push(relation),
        }
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.global_init.len() + self.regional.len() + self.regional_init.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.global
            .iter()
            .chain(self.global_init.iter())
            .chain(self.regional.iter())
            .chain(self.regional_init.iter())
    }
}

impl Extend<Relation> for RelationSet {
    fn extend<I: IntoIterator<Item = Relation>>(&mut self, iter: I) {
        for relation in iter {
            self.push(relation);
        }
    }
}

impl IntoIterator for RelationSet {
    type Item = Relation;
    type IntoIter = std::vec::IntoIter<Relation>;

    fn into_iter(self) -> Self::IntoIter {
        let mut all = self.global;
        all.extend(self.global_init);
        all.extend(self.regional);
        all.extend(self.regional_init);
        all.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::TimeAxis;

    fn namespace() -> ModelNamespace {
        ModelNamespace::new(
            TimeAxis::uniform(2020.0, 2030.0, 5.0).unwrap(),
            vec!["A".to_string(), "B".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn points_follow_the_kind() {
        let ns = namespace();
        let global = Relation::global("g", |_, _| Ok(Evaluation::Skip));
        let global_init = Relation::global_init("gi", |_| Ok(Evaluation::Skip));
        let regional = Relation::regional("r", |_, _, _| Ok(Evaluation::Skip));
        let regional_init = Relation::regional_init("ri", |_, _| Ok(Evaluation::Skip));

        assert_eq!(global.points(&ns).len(), 3);
        assert_eq!(global_init.points(&ns), vec![Point { t: 0, region: None }]);
        assert_eq!(regional.points(&ns).len(), 6);
        assert!(regional_init.points(&ns).iter().all(|p| p.t == 0));
        assert_eq!(regional_init.points(&ns).len(), 2);
    }

    #[test]
    fn relation_set_groups_by_kind() {
        let mut set = RelationSet::new();
        set.push(Relation::regional("r", |_, _, _| Ok(Evaluation::Skip)));
        set.push(Relation::global_init("gi", |_| Ok(Evaluation::Skip)));
        set.push(Relation::global("g", |_, t| {
            Ok(Evaluation::equals(t as f64, 0.0))
        }));

        let labels: Vec<&str> = set.iter().map(Relation::label).collect();
        assert_eq!(labels, vec!["g", "gi", "r"]);
        assert_eq!(set.global_init.len(), 1);
    }

    #[test]
    fn evaluate_passes_the_point() {
        let ns = namespace();
        let relation = Relation::regional("r", |_, t, r| {
            Ok(Evaluation::equals(t as f64, r as f64))
        });
        let result = relation
            .evaluate(&ns, Point { t: 2, region: Some(1) })
            .unwrap();
        assert_eq!(result, Evaluation::Residual(1.0));
    }

    #[test]
    fn regional_relations_need_a_region() {
        let ns = namespace();
        let regional = Relation::regional("r", |_, _, _| Ok(Evaluation::Residual(0.0)));
        let regional_init = Relation::regional_init("ri", |_, _| Ok(Evaluation::Residual(0.0)));
        let point = Point { t: 1, region: None };

        assert!(matches!(
            regional.evaluate(&ns, point),
            Err(RSIAMError::IndexMismatch { name, .. }) if name == "r"
        ));
        assert!(matches!(
            regional_init.evaluate(&ns, point),
            Err(RSIAMError::IndexMismatch { .. })
        ));
        // Global relations ignore the region
        let global = Relation::global("g", |_, t| Ok(Evaluation::equals(t as f64, 1.0)));
        assert_eq!(
            global.evaluate(&ns, Point { t: 1, region: Some(0) }).unwrap(),
            Evaluation::Residual(0.0)
        );
    }
}

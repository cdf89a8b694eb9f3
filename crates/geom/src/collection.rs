use crate::GeomError;
use crate::batch::{BatchLayoutPlan, BatchStrategy, NodePerRequirement};
use crate::buffer::BufferLimits;
use crate::factory::DrawResourceFactory;
use crate::requirements::GeomRequirements;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Index of a unique requirement inside a [`RequirementCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequirementId(pub usize);

/// Frozen requirements plus the batch plan computed for them.
///
/// Shared between every factory handed out until the next new requirement
/// arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLayout {
    requirements: Vec<GeomRequirements>,
    plan: BatchLayoutPlan,
}

impl BatchLayout {
    pub fn requirements(&self) -> &[GeomRequirements] {
        &self.requirements
    }

    pub fn plan(&self) -> &BatchLayoutPlan {
        &self.plan
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

/// A collection of unique [`GeomRequirements`]. Identical entries are merged.
#[derive(Debug)]
pub struct RequirementCollection {
    entries: Vec<GeomRequirements>,
    layout: Option<Arc<BatchLayout>>,
    strategy: Box<dyn BatchStrategy>,
    limits: BufferLimits,
}

impl Default for RequirementCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementCollection {
    /// Empty collection using the one-node-per-requirement plan.
    pub fn new() -> Self {
        Self::with_strategy(Box::new(NodePerRequirement))
    }

    pub fn with_strategy(strategy: Box<dyn BatchStrategy>) -> Self {
        Self {
            entries: Vec::new(),
            layout: None,
            strategy,
            limits: BufferLimits::default(),
        }
    }

    /// Buffer limits applied to every factory this collection produces.
    pub fn with_limits(mut self, limits: BufferLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Add a requirement, returning the id of the structurally equal entry if
    /// one exists. A new entry invalidates the computed batch layout.
    pub fn add(&mut self, requirement: GeomRequirements) -> RequirementId {
        if let Some(i) = self.entries.iter().position(|e| *e == requirement) {
            return RequirementId(i);
        }
        self.entries.push(requirement);
        if self.layout.take().is_some() {
            tracing::debug!(
                count = self.entries.len(),
                "batch layout invalidated by new requirement"
            );
        }
        RequirementId(self.entries.len() - 1)
    }

    pub fn get(&self, id: RequirementId) -> Option<&GeomRequirements> {
        self.entries.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RequirementId, &GeomRequirements)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, r)| (RequirementId(i), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cached layout, if one has been computed since the last new entry.
    pub fn layout(&self) -> Option<Arc<BatchLayout>> {
        self.layout.clone()
    }

    /// A fresh factory for one block, or `None` when nothing was ever added.
    ///
    /// Computes and caches the batch layout on first use.
    pub fn draw_resource_factory(&mut self) -> Result<Option<DrawResourceFactory>, GeomError> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        let layout = match &self.layout {
            Some(layout) => Arc::clone(layout),
            None => {
                let plan = self.strategy.plan(&self.entries);
                plan.validate(self.entries.len())?;
                tracing::debug!(
                    requirements = self.entries.len(),
                    batch_nodes = plan.nodes().len(),
                    strategy = ?self.strategy,
                    "batch layout computed"
                );
                let layout = Arc::new(BatchLayout {
                    requirements: self.entries.clone(),
                    plan,
                });
                self.layout = Some(Arc::clone(&layout));
                layout
            }
        };
        Ok(Some(DrawResourceFactory::new(layout, self.limits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SharedStateGrouping;
    use crate::requirements::VertexLayout;
    use meshpage_common::TextureRef;

    fn req(tex: &str) -> GeomRequirements {
        GeomRequirements::new(VertexLayout::v3n3t2()).with_texture(TextureRef::new(tex))
    }

    #[test]
    fn duplicates_share_an_id() {
        let mut c = RequirementCollection::new();
        let a = c.add(req("leaf"));
        let b = c.add(req("bark"));
        let a2 = c.add(req("leaf"));
        assert_eq!(a, RequirementId(0));
        assert_eq!(b, RequirementId(1));
        assert_eq!(a2, a);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn nan_shader_inputs_still_dedup() {
        use crate::requirements::{ShaderSetting, ShaderValue};
        use glam::Vec4;

        let r = req("leaf")
            .with_shader_setting(ShaderSetting::new("wind", ShaderValue::Float(f32::NAN)))
            .with_shader_setting(ShaderSetting::new(
                "tint",
                ShaderValue::Vec4(Vec4::new(1.0, f32::NAN, 0.0, 1.0)),
            ));
        let mut c = RequirementCollection::new();
        let a = c.add(r.clone());
        let b = c.add(r.clone());
        assert_eq!(a, b);
        assert_eq!(c.len(), 1);

        // distinct bit patterns stay distinct
        let with_wind = |v: f32| {
            req("leaf").with_shader_setting(ShaderSetting::new("w", ShaderValue::Float(v)))
        };
        assert_ne!(c.add(with_wind(0.0)), c.add(with_wind(-0.0)));
    }

    #[test]
    fn new_ids_count_unique_entries() {
        let mut c = RequirementCollection::new();
        let names = ["a", "b", "a", "c", "b", "d", "d"];
        let mut unique = 0;
        for n in names {
            let before = c.len();
            let id = c.add(req(n));
            if c.len() > before {
                assert_eq!(id, RequirementId(unique));
                unique += 1;
            } else {
                assert!(id.0 < unique);
            }
        }
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn empty_collection_has_no_factory() {
        let mut c = RequirementCollection::new();
        assert!(c.draw_resource_factory().unwrap().is_none());
    }

    #[test]
    fn layout_is_reused_until_a_new_entry() {
        let mut c = RequirementCollection::new();
        c.add(req("leaf"));
        let f1 = c.draw_resource_factory().unwrap().unwrap();
        let f2 = c.draw_resource_factory().unwrap().unwrap();
        assert!(Arc::ptr_eq(f1.layout(), f2.layout()));

        // duplicate keeps the layout
        c.add(req("leaf"));
        assert!(c.layout().is_some());

        c.add(req("bark"));
        assert!(c.layout().is_none());
        let f3 = c.draw_resource_factory().unwrap().unwrap();
        assert!(!Arc::ptr_eq(f1.layout(), f3.layout()));
        assert_eq!(f3.layout().len(), 2);
        assert_eq!(f3.layout().plan().assignment().len(), 2);
    }

    #[test]
    fn same_adds_give_same_plan() {
        let build = || {
            let mut c = RequirementCollection::with_strategy(Box::new(SharedStateGrouping));
            for n in ["a", "b", "a", "c"] {
                c.add(req(n));
            }
            c.draw_resource_factory().unwrap().unwrap().layout().as_ref().clone()
        };
        assert_eq!(build(), build());
    }

    #[derive(Debug)]
    struct Broken;

    impl BatchStrategy for Broken {
        fn plan(&self, _requirements: &[GeomRequirements]) -> BatchLayoutPlan {
            BatchLayoutPlan::new()
        }
    }

    #[test]
    fn invalid_strategy_output_is_rejected() {
        let mut c = RequirementCollection::with_strategy(Box::new(Broken));
        c.add(req("leaf"));
        let err = c.draw_resource_factory().unwrap_err();
        assert!(matches!(err, GeomError::InvalidPlan(_)));
    }
}

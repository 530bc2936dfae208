//! Symmetric geometric models.

use super::{ContributionModel, ModelContext};
use crate::elements::ElementStore;
use crate::EngineResult;

/// Kohler model: a third component never contributes to either side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Kohler;

/// Muggianu model: a third component splits evenly between both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Muggianu;

impl ContributionModel for Kohler {
    fn coefficient<S: ElementStore + ?Sized>(
        &self,
        _ctx: &ModelContext<'_, S>,
        _k: &str,
        _i: &str,
        _j: &str,
    ) -> EngineResult<f64> {
        Ok(0.0)
    }

    fn is_constant(&self) -> bool {
        true
    }
}

impl ContributionModel for Muggianu {
    fn coefficient<S: ElementStore + ?Sized>(
        &self,
        _ctx: &ModelContext<'_, S>,
        _k: &str,
        _i: &str,
        _j: &str,
    ) -> EngineResult<f64> {
        Ok(0.5)
    }

    fn is_constant(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementTable;
    use crate::{OrderingClass, PhaseState};

    const SS: OrderingClass = OrderingClass::SolidSolution;

    #[test]
    fn test_constant_coefficients() {
        let table = ElementTable::builtin();
        let ctx = ModelContext::new(&table, 1000.0, PhaseState::Solid, SS).unwrap();
        // Symbols are not even looked up
        assert_eq!(Kohler.coefficient(&ctx, "Cr", "Fe", "Xx").unwrap(), 0.0);
        assert_eq!(Muggianu.coefficient(&ctx, "Cr", "Fe", "Xx").unwrap(), 0.5);
        assert!(Kohler.is_constant() && Muggianu.is_constant());
    }
}

//! Toop-Kohler model with automatic choice of the asymmetric component.
//!
//! For a triple (k, i, j) the equimolar binary enthalpies
//! `a = ΔH_ij`, `b = ΔH_ik`, `c = ΔH_jk` decide which component behaves
//! asymmetrically:
//!
//! - all three of one strict sign: the component absent from the binary of
//!   smallest magnitude (`a` → k, `b` → j, otherwise i)
//! - mixed signs: the component opposite the binary whose sign differs from
//!   the other two (`c` if `a·b > 0`, else `b` if `a·c > 0`, else `a`)
//!
//! The coefficient is 1 when the asymmetric component is `j` and 0 otherwise.

use super::{ContributionModel, ModelContext};
use crate::elements::ElementStore;
use crate::EngineResult;

/// Toop-Kohler model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToopKohler;

/// Selects the asymmetric component of the triple (k, i, j).
///
/// Returns one of the three input symbols.
pub fn asymmetric_component<'s, S: ElementStore + ?Sized>(
    ctx: &ModelContext<'_, S>,
    k: &'s str,
    i: &'s str,
    j: &'s str,
) -> EngineResult<&'s str> {
    let a: f64 = ctx.binary(i, j)?.enthalpy_of_mixing(0.5, 0.5);
    let b: f64 = ctx.binary(i, k)?.enthalpy_of_mixing(0.5, 0.5);
    let c: f64 = ctx.binary(j, k)?.enthalpy_of_mixing(0.5, 0.5);

    let same_sign = (a > 0.0 && b > 0.0 && c > 0.0) || (a < 0.0 && b < 0.0 && c < 0.0);
    let (a, b, t) = if same_sign {
        let (a, b, c) = (a.abs(), b.abs(), c.abs());
        (a, b, a.min(b).min(c))
    } else {
        let t = if a * b > 0.0 {
            c
        } else if a * c > 0.0 {
            b
        } else {
            a
        };
        (a, b, t)
    };

    let selected = if t == a {
        k
    } else if t == b {
        j
    } else {
        i
    };
    log::trace!("asymmetric component of ({}, {}, {}) is {}", k, i, j, selected);
    Ok(selected)
}

impl ContributionModel for ToopKohler {
    fn coefficient<S: ElementStore + ?Sized>(
        &self,
        ctx: &ModelContext<'_, S>,
        k: &str,
        i: &str,
        j: &str,
    ) -> EngineResult<f64> {
        let asymmetric = asymmetric_component(ctx, k, i, j)?;
        Ok(if asymmetric == j && asymmetric != k && asymmetric != i { 1.0 } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementParameters, ElementStore, ElementTable};
    use crate::{OrderingClass, PhaseState};

    fn context(table: &ElementTable) -> ModelContext<'_, ElementTable> {
        ModelContext::new(table, 1200.0, PhaseState::Liquid, OrderingClass::SolidSolution).unwrap()
    }

    #[test]
    fn test_selection_is_one_of_the_triple() {
        let table = ElementTable::builtin();
        let ctx = context(&table);
        let selected = asymmetric_component(&ctx, "Al", "Fe", "Ni").unwrap();
        assert!(["Al", "Fe", "Ni"].contains(&selected));
    }

    #[test]
    fn test_coefficient_is_binary_valued() {
        let table = ElementTable::builtin();
        let ctx = context(&table);
        let elements = ["Fe", "Ni", "Cr", "Al", "Cu", "Si"];
        for k in elements {
            for i in elements {
                for j in elements {
                    if k == i || k == j || i == j {
                        continue;
                    }
                    let alpha = ToopKohler.coefficient(&ctx, k, i, j).unwrap();
                    assert!(alpha == 0.0 || alpha == 1.0);
                }
            }
        }
    }

    #[test]
    fn test_mixed_signs_pick_the_odd_binary() {
        // Ag-Au and Au-Cu are exothermic, Ag-Cu is not: Au sits opposite Ag-Cu
        let table = ElementTable::builtin();
        let ctx = context(&table);
        assert_eq!(asymmetric_component(&ctx, "Cu", "Ag", "Au").unwrap(), "Au");
        assert_eq!(ToopKohler.coefficient(&ctx, "Cu", "Ag", "Au").unwrap(), 1.0);
        assert_eq!(ToopKohler.coefficient(&ctx, "Cu", "Au", "Ag").unwrap(), 0.0);
    }

    #[test]
    fn test_same_sign_picks_weakest_binary() {
        let table = ElementTable::builtin();
        let ctx = context(&table);
        // Fe-Si is the weakest of Fe-Cr, Fe-Si and Cr-Si
        assert_eq!(asymmetric_component(&ctx, "Si", "Fe", "Cr").unwrap(), "Cr");
        assert_eq!(ToopKohler.coefficient(&ctx, "Si", "Fe", "Cr").unwrap(), 1.0);
        // Fe-Cr is the weakest of Fe-Ni, Fe-Cr and Ni-Cr
        assert_eq!(asymmetric_component(&ctx, "Cr", "Fe", "Ni").unwrap(), "Ni");
        // Fe-Ni is the weakest of Fe-Ni, Fe-Al and Ni-Al
        assert_eq!(asymmetric_component(&ctx, "Al", "Fe", "Ni").unwrap(), "Al");
        assert_eq!(ToopKohler.coefficient(&ctx, "Al", "Fe", "Ni").unwrap(), 0.0);
    }

    #[test]
    fn test_ideal_binary_marks_the_third_element() {
        let builtin = ElementTable::builtin();
        let fe = builtin.lookup("Fe").unwrap();
        let twin = |symbol: &str| ElementParameters { symbol: symbol.to_string(), ..fe.clone() };
        let table = ElementTable::from_elements([
            twin("Aa"),
            twin("Bb"),
            builtin.lookup("Ni").unwrap().clone(),
        ]);
        let ctx = context(&table);
        assert_eq!(ctx.binary("Aa", "Bb").unwrap().enthalpy_of_mixing(0.5, 0.5), 0.0);

        for (k, i, j) in [("Ni", "Aa", "Bb"), ("Aa", "Ni", "Bb"), ("Aa", "Bb", "Ni")] {
            assert_eq!(asymmetric_component(&ctx, k, i, j).unwrap(), "Ni");
        }
        assert_eq!(ToopKohler.coefficient(&ctx, "Aa", "Bb", "Ni").unwrap(), 1.0);
        assert_eq!(ToopKohler.coefficient(&ctx, "Ni", "Aa", "Bb").unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_element_propagates() {
        let table = ElementTable::builtin();
        let ctx = context(&table);
        assert!(ToopKohler.coefficient(&ctx, "Xx", "Fe", "Ni").is_err());
    }
}

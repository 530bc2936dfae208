//! Element parameter store.
//!
//! The Miedema model needs a fixed set of tabulated parameters per element.
//! The engine only depends on the [`ElementStore`] trait; [`ElementTable`] is
//! an immutable in-memory implementation that can be loaded from JSON or
//! populated from the built-in table of common alloying elements.
//!
//! # JSON format
//!
//! ```json
//! [
//!   { "symbol": "Fe", "phi": 4.93, "n_ws": 1.77, "volume": 3.69, "u": 0.04,
//!     "hybridization": "alpha", "hybridization_value": 1.0,
//!     "transition_metal": true, "transition_enthalpy": 0.0, "melting_point": 1811.0 }
//! ]
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

/// Hybridization class used by the R/P correction term.
///
/// The correction only applies between two elements that both carry a class
/// other than [`HybridizationClass::Other`] and whose classes differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HybridizationClass {
    /// Transition-metal side (R parameter)
    Alpha,
    /// Polyvalent non-transition side (P parameter)
    Beta,
    /// No hybridization contribution
    Other,
}

/// Tabulated Miedema parameters of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementParameters {
    /// Element symbol (case sensitive, e.g. `Fe`)
    pub symbol: String,
    /// Electronegativity-like work function φ* (V)
    pub phi: f64,
    /// Electron density at the Wigner-Seitz cell boundary, n_ws^(1/3)
    pub n_ws: f64,
    /// Molar volume V^(2/3) (cm²)
    pub volume: f64,
    /// Volume sensitivity coefficient
    pub u: f64,
    /// Hybridization class
    pub hybridization: HybridizationClass,
    /// Hybridization magnitude (R or P)
    pub hybridization_value: f64,
    /// Whether the element is a transition metal
    pub transition_metal: bool,
    /// Structural transformation enthalpy (kJ/mol)
    pub transition_enthalpy: f64,
    /// Melting temperature (K)
    pub melting_point: f64,
    /// Element name
    #[serde(default)]
    pub name: String,
}

/// Keyed read-only lookup of element parameters.
///
/// Implementations must be safe for concurrent lookups.
pub trait ElementStore: Send + Sync {
    /// Looks up an element by symbol.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownElement`] if the symbol is absent.
    fn lookup(&self, symbol: &str) -> EngineResult<&ElementParameters>;
}

impl<S: ElementStore + ?Sized> ElementStore for &S {
    fn lookup(&self, symbol: &str) -> EngineResult<&ElementParameters> {
        (**self).lookup(symbol)
    }
}

impl<S: ElementStore + ?Sized> ElementStore for Arc<S> {
    fn lookup(&self, symbol: &str) -> EngineResult<&ElementParameters> {
        (**self).lookup(symbol)
    }
}

/// Immutable in-memory element store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementTable {
    elements: HashMap<String, ElementParameters>,
}

impl ElementTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from parameter records. Later duplicates replace earlier ones.
    pub fn from_elements<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = ElementParameters>,
    {
        ElementTable { elements: elements.into_iter().map(|e| (e.symbol.clone(), e)).collect() }
    }

    /// Parses a JSON array of parameter records.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let records: Vec<ElementParameters> =
            serde_json::from_str(json).map_err(|e| EngineError::ElementData(e.to_string()))?;
        Self::validated(records)
    }

    /// Parses a JSON array of parameter records from a reader.
    pub fn from_reader<R: std::io::Read>(reader: R) -> EngineResult<Self> {
        let records: Vec<ElementParameters> =
            serde_json::from_reader(reader).map_err(|e| EngineError::ElementData(e.to_string()))?;
        Self::validated(records)
    }

    fn validated(records: Vec<ElementParameters>) -> EngineResult<Self> {
        for record in &records {
            if record.symbol.is_empty() {
                return Err(EngineError::ElementData("empty element symbol".to_string()));
            }
            if !(record.n_ws > 0.0 && record.volume > 0.0 && record.melting_point > 0.0) {
                return Err(EngineError::ElementData(format!(
                    "{}: n_ws, volume and melting point must be positive",
                    record.symbol
                )));
            }
        }
        Ok(Self::from_elements(records))
    }

    /// Built-in Miedema parameters for common alloying elements.
    ///
    /// Values follow the 1983 compilation (φ*, n_ws^(1/3), V^(2/3)); supply a
    /// full table through [`ElementTable::from_json`] for other elements.
    pub fn builtin() -> Self {
        use HybridizationClass::*;

        #[rustfmt::skip]
        let rows: [(&str, &str, f64, f64, f64, f64, HybridizationClass, f64, bool, f64, f64); 22] = [
            // symbol, name, phi, n_ws, V, u, class, R/P, transition, dH_trans, Tm
            ("Fe", "Iron",       4.93, 1.77, 3.69, 0.04, Alpha, 1.0, true,  0.0,   1811.0),
            ("Ni", "Nickel",     5.20, 1.75, 3.52, 0.04, Alpha, 1.0, true,  0.0,   1728.0),
            ("Co", "Cobalt",     5.10, 1.75, 3.55, 0.04, Alpha, 1.0, true,  0.0,   1768.0),
            ("Cr", "Chromium",   4.65, 1.73, 3.74, 0.04, Alpha, 1.0, true,  0.0,   2180.0),
            ("Mn", "Manganese",  4.45, 1.61, 3.78, 0.04, Alpha, 1.0, true,  0.0,   1519.0),
            ("Ti", "Titanium",   3.80, 1.52, 4.12, 0.04, Alpha, 1.0, true,  0.0,   1941.0),
            ("V",  "Vanadium",   4.25, 1.64, 4.12, 0.04, Alpha, 1.0, true,  0.0,   2183.0),
            ("Zr", "Zirconium",  3.45, 1.41, 5.81, 0.04, Alpha, 1.0, true,  0.0,   2128.0),
            ("Nb", "Niobium",    4.05, 1.64, 4.89, 0.04, Alpha, 1.0, true,  0.0,   2750.0),
            ("Mo", "Molybdenum", 4.65, 1.77, 4.45, 0.04, Alpha, 1.0, true,  0.0,   2896.0),
            ("W",  "Tungsten",   4.80, 1.81, 4.50, 0.04, Alpha, 1.0, true,  0.0,   3695.0),
            ("Cu", "Copper",     4.45, 1.47, 3.70, 0.07, Other, 0.0, true,  0.0,   1358.0),
            ("Ag", "Silver",     4.45, 1.39, 4.72, 0.07, Other, 0.0, true,  0.0,   1235.0),
            ("Au", "Gold",       5.15, 1.57, 4.70, 0.07, Other, 0.0, true,  0.0,   1337.0),
            ("Al", "Aluminium",  4.20, 1.39, 4.64, 0.07, Beta,  1.9, false, 0.0,    933.0),
            ("Si", "Silicon",    4.70, 1.50, 4.20, 0.04, Beta,  2.1, false, 34.0,  1687.0),
            ("Ge", "Germanium",  4.55, 1.37, 4.60, 0.07, Beta,  2.1, false, 25.0,  1211.0),
            ("C",  "Carbon",     6.20, 1.90, 1.80, 0.04, Beta,  2.1, false, 100.0, 3800.0),
            ("P",  "Phosphorus", 5.55, 1.65, 4.10, 0.04, Beta,  2.1, false, 17.0,   317.0),
            ("Sn", "Tin",        4.15, 1.24, 6.43, 0.07, Beta,  1.5, false, 5.1,    505.0),
            ("Mg", "Magnesium",  3.45, 1.17, 5.81, 0.10, Other, 0.0, false, 0.0,    923.0),
            ("Zn", "Zinc",       4.10, 1.32, 4.38, 0.10, Other, 0.0, false, 0.0,    693.0),
        ];

        Self::from_elements(rows.into_iter().map(
            |(symbol, name, phi, n_ws, volume, u, hybridization, hyb, transition, dh, tm)| {
                ElementParameters {
                    symbol: symbol.to_string(),
                    phi,
                    n_ws,
                    volume,
                    u,
                    hybridization,
                    hybridization_value: hyb,
                    transition_metal: transition,
                    transition_enthalpy: dh,
                    melting_point: tm,
                    name: name.to_string(),
                }
            },
        ))
    }

    /// Number of elements in the table.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the table holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Sorted list of available symbols.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.elements.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

impl ElementStore for ElementTable {
    fn lookup(&self, symbol: &str) -> EngineResult<&ElementParameters> {
        self.elements.get(symbol).ok_or_else(|| EngineError::UnknownElement(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = ElementTable::builtin();
        let fe = table.lookup("Fe").unwrap();
        assert_eq!(fe.symbol, "Fe");
        assert!(fe.transition_metal);
        assert_eq!(fe.hybridization, HybridizationClass::Alpha);
        assert_eq!(table.len(), 22);
    }

    #[test]
    fn test_unknown_element() {
        let table = ElementTable::builtin();
        assert_eq!(table.lookup("Q").unwrap_err(), EngineError::UnknownElement("Q".to_string()));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            { "symbol": "Fe", "phi": 4.93, "n_ws": 1.77, "volume": 3.69, "u": 0.04,
              "hybridization": "alpha", "hybridization_value": 1.0, "transition_metal": true,
              "transition_enthalpy": 0.0, "melting_point": 1811.0 }
        ]"#;
        let table = ElementTable::from_json(json).unwrap();
        let fe = table.lookup("Fe").unwrap();
        assert_eq!(fe.phi, 4.93);
        assert_eq!(fe.name, "");
        assert_eq!(table.symbols(), vec!["Fe"]);
    }

    #[test]
    fn test_from_json_rejects_bad_records() {
        let json = r#"[
            { "symbol": "Xx", "phi": 4.0, "n_ws": 0.0, "volume": 3.0, "u": 0.04,
              "hybridization": "other", "hybridization_value": 0.0, "transition_metal": false,
              "transition_enthalpy": 0.0, "melting_point": 1000.0 }
        ]"#;
        assert!(matches!(ElementTable::from_json(json), Err(EngineError::ElementData(_))));
        assert!(matches!(ElementTable::from_json("not json"), Err(EngineError::ElementData(_))));
    }

    #[test]
    fn test_store_through_references() {
        let table = Arc::new(ElementTable::builtin());
        fn lookup_phi<S: ElementStore>(store: S) -> f64 {
            store.lookup("Ni").unwrap().phi
        }
        assert_eq!(lookup_phi(&*table), 5.20);
        assert_eq!(lookup_phi(table.clone()), 5.20);
    }
}

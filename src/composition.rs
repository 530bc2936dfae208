//! Alloy compositions.
//!
//! A [`Composition`] maps element symbols to non-negative amounts while
//! preserving insertion order, so the binary pairs of a system are always
//! enumerated in the same sequence. Calculations work on a normalised copy
//! obtained from [`Composition::normalized`]; the caller's values are never
//! rescaled in place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

/// Ordered mapping from element symbol to amount (mole fraction once normalised).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Composition {
    components: Vec<(String, f64)>,
}

impl Composition {
    /// Creates an empty composition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a composition from `(symbol, amount)` pairs.
    ///
    /// # Example
    ///
    /// ```
    /// use miedema_mix::Composition;
    ///
    /// let alloy = Composition::from_pairs([("Fe", 0.7), ("Ni", 0.3)]).unwrap();
    /// assert_eq!(alloy.get("Ni"), Some(0.3));
    /// ```
    pub fn from_pairs<I, S>(pairs: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut composition = Composition::new();
        for (symbol, amount) in pairs {
            composition.insert(symbol, amount)?;
        }
        Ok(composition)
    }

    /// Sets the amount of an element, replacing any previous value.
    pub fn insert<S: Into<String>>(&mut self, symbol: S, amount: f64) -> EngineResult<()> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(EngineError::InvalidComposition("empty element symbol".to_string()));
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(EngineError::InvalidComposition(format!(
                "amount of {} must be finite and non-negative, got {}",
                symbol, amount
            )));
        }
        match self.components.iter_mut().find(|(s, _)| *s == symbol) {
            Some(entry) => entry.1 = amount,
            None => self.components.push((symbol, amount)),
        }
        Ok(())
    }

    /// Amount of an element, if present.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.components.iter().find(|(s, _)| s == symbol).map(|(_, x)| *x)
    }

    /// Returns true if the element is part of the composition.
    pub fn contains(&self, symbol: &str) -> bool {
        self.position(symbol).is_some()
    }

    /// Index of an element in insertion order.
    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.components.iter().position(|(s, _)| s == symbol)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Symbols in insertion order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|(s, _)| s.as_str())
    }

    /// Amounts in insertion order.
    pub fn fractions(&self) -> impl Iterator<Item = f64> + '_ {
        self.components.iter().map(|(_, x)| *x)
    }

    /// `(symbol, amount)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.components.iter().map(|(s, x)| (s.as_str(), *x))
    }

    /// Sum of all amounts.
    pub fn total(&self) -> f64 {
        self.components.iter().map(|(_, x)| x).sum()
    }

    /// Copy whose amounts sum to one.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidComposition`] if the composition is empty or all
    /// amounts are zero.
    pub fn normalized(&self) -> EngineResult<Self> {
        let total = self.total();
        if self.is_empty() || total <= 0.0 {
            return Err(EngineError::InvalidComposition(
                "composition must contain a positive amount".to_string(),
            ));
        }
        Ok(Composition {
            components: self.components.iter().map(|(s, x)| (s.clone(), x / total)).collect(),
        })
    }

    /// Dilutes this composition (taken as a matrix) with `fraction` of `element`.
    ///
    /// Every matrix amount is normalised and scaled by `1 - fraction`; the added
    /// element receives `fraction` (summed with its matrix share if already present).
    pub fn with_addition(&self, element: &str, fraction: f64) -> EngineResult<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(EngineError::InvalidComposition(format!(
                "added fraction of {} must lie in [0, 1], got {}",
                element, fraction
            )));
        }
        let matrix = self.normalized()?;
        let mut diluted = Composition::new();
        for (symbol, x) in matrix.iter() {
            diluted.insert(symbol, x * (1.0 - fraction))?;
        }
        let existing = diluted.get(element).unwrap_or(0.0);
        diluted.insert(element, existing + fraction)?;
        Ok(diluted)
    }
}

/// Parses formula strings such as `Fe0.7Ni0.3` or `AlCoCrFeNi`.
///
/// Each element symbol is an uppercase letter optionally followed by lowercase
/// letters, then an optional decimal amount (default 1). The result is normalised.
impl FromStr for Composition {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        let mut composition = Composition::new();
        let mut pos = 0;

        while pos < chars.len() {
            if !chars[pos].is_ascii_uppercase() {
                return Err(EngineError::InvalidComposition(format!(
                    "unexpected '{}' in formula '{}'",
                    chars[pos], s
                )));
            }
            let start = pos;
            pos += 1;
            while pos < chars.len() && chars[pos].is_ascii_lowercase() {
                pos += 1;
            }
            let symbol: String = chars[start..pos].iter().collect();

            let amount_start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                pos += 1;
            }
            let amount = if amount_start == pos {
                1.0
            } else {
                let text: String = chars[amount_start..pos].iter().collect();
                text.parse::<f64>().map_err(|_| {
                    EngineError::InvalidComposition(format!("bad amount '{}' for {}", text, symbol))
                })?
            };

            let existing = composition.get(&symbol).unwrap_or(0.0);
            composition.insert(symbol, existing + amount)?;
        }

        composition.normalized()
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, x) in self.iter() {
            write!(f, "{}{}", symbol, x)?;
        }
        Ok(())
    }
}

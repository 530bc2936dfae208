//! Contribution coefficient reports.
//!
//! For every three-element subset of a composition the six coefficients
//! linking the triple are collected into a [`TripleCoefficients`] row and
//! handed to a [`CoefficientSink`]. What happens to the rows (kept in memory,
//! logged, serialised) is up to the sink.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::composition::Composition;
use crate::elements::ElementStore;
use crate::models::{ContributionModel, ExtrapolationModel, ModelContext};
use crate::EngineResult;

/// The six contribution coefficients of an element triple.
///
/// Field `a_b` holds the coefficient of `a` toward `b` in the binary formed
/// by `b` and the third element, e.g. `k_i = α(k, i, j)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripleCoefficients {
    pub model: ExtrapolationModel,
    pub k: String,
    pub i: String,
    pub j: String,
    pub k_i: f64,
    pub k_j: f64,
    pub i_j: f64,
    pub i_k: f64,
    pub j_i: f64,
    pub j_k: f64,
}

impl TripleCoefficients {
    /// Evaluates all six coefficients of (k, i, j).
    pub fn compute<S: ElementStore + ?Sized>(
        ctx: &ModelContext<'_, S>,
        model: ExtrapolationModel,
        k: &str,
        i: &str,
        j: &str,
    ) -> EngineResult<Self> {
        Ok(TripleCoefficients {
            model,
            k: k.to_string(),
            i: i.to_string(),
            j: j.to_string(),
            k_i: model.coefficient(ctx, k, i, j)?,
            k_j: model.coefficient(ctx, k, j, i)?,
            i_j: model.coefficient(ctx, i, j, k)?,
            i_k: model.coefficient(ctx, i, k, j)?,
            j_i: model.coefficient(ctx, j, i, k)?,
            j_k: model.coefficient(ctx, j, k, i)?,
        })
    }
}

impl fmt::Display for TripleCoefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (k, i, j) = (&self.k, &self.i, &self.j);
        write_line(f, k, i, j, self.k_i, self.k_j)?;
        writeln!(f)?;
        write_line(f, i, j, k, self.i_j, self.i_k)?;
        writeln!(f)?;
        write_line(f, j, i, k, self.j_i, self.j_k)
    }
}

/// `a-b: α(a,b,c), a-c: α(a,c,b) in b-c`
fn write_line(
    f: &mut fmt::Formatter<'_>,
    a: &str,
    b: &str,
    c: &str,
    ab: f64,
    ac: f64,
) -> fmt::Result {
    write!(f, "{}-{}:\t{:.6},\t{}-{}:\t{:.6}\tin\t{}-{}", a, b, ab, a, c, ac, b, c)
}

/// Receiver of contribution coefficient rows.
pub trait CoefficientSink {
    fn record(&mut self, row: TripleCoefficients) -> EngineResult<()>;
}

/// Collects rows in memory.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    rows: Vec<TripleCoefficients>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[TripleCoefficients] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<TripleCoefficients> {
        self.rows
    }
}

impl CoefficientSink for VecSink {
    fn record(&mut self, row: TripleCoefficients) -> EngineResult<()> {
        self.rows.push(row);
        Ok(())
    }
}

/// Writes every row to the `log` facade.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    level: log::Level,
}

impl LogSink {
    pub fn new(level: log::Level) -> Self {
        LogSink { level }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        LogSink::new(log::Level::Info)
    }
}

impl CoefficientSink for LogSink {
    fn record(&mut self, row: TripleCoefficients) -> EngineResult<()> {
        log::log!(
            self.level,
            "{} coefficients of ({}, {}, {}):\n{}",
            row.model,
            row.k,
            row.i,
            row.j,
            row
        );
        Ok(())
    }
}

/// Emits one row per three-element subset of `composition`.
///
/// Subsets are enumerated in insertion order, fractions are ignored.
///
/// # Returns
///
/// The number of rows recorded.
pub fn emit_contribution_report<S: ElementStore + ?Sized>(
    ctx: &ModelContext<'_, S>,
    composition: &Composition,
    model: ExtrapolationModel,
    sink: &mut dyn CoefficientSink,
) -> EngineResult<usize> {
    let symbols: Vec<&str> = composition.symbols().collect();
    let n = symbols.len();
    let mut rows = 0;
    for a in 0..n {
        for b in (a + 1)..n {
            for c in (b + 1)..n {
                let (k, i, j) = (symbols[a], symbols[b], symbols[c]);
                let row = TripleCoefficients::compute(ctx, model, k, i, j)?;
                sink.record(row)?;
                rows += 1;
            }
        }
    }
    log::debug!("{} report for {}: {} triples", model, composition, rows);
    Ok(rows)
}

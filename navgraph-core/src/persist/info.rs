//! Text sidecar recording the parameters a graph was built with.
//!
//! Line 1 holds `optimal_connections max_connections max_connections_0
//! ef_construction`, followed by `num_nodes` and `num_layers` on their own
//! lines. Benchmarking sidecars append the layer-0 and upper-layer distance
//! counts and the construction time in milliseconds, one per line.

use std::{io::Write, time::Duration};

use tracing::error;

use crate::{
    distance::DistanceTally,
    hnsw::{Hnsw, HnswParams},
    store::VectorStore,
};

use super::error::PersistError;

/// Parameters and statistics recorded alongside a saved graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GraphInfo {
    /// Neighbours selected per inserted node.
    pub optimal_connections: usize,
    /// Degree bound above layer 0.
    pub max_connections: usize,
    /// Degree bound at layer 0.
    pub max_connections_0: usize,
    /// Beam width used while linking.
    pub ef_construction: usize,
    /// Nodes stored in the graph file.
    pub num_nodes: usize,
    /// Layer count, one above the entry point's top layer.
    pub num_layers: usize,
    /// Present in benchmarking sidecars only.
    pub benchmark: Option<BuildReport>,
}

/// Construction cost appended by benchmarking sidecars.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BuildReport {
    /// Distance evaluations spent during construction.
    pub tally: DistanceTally,
    /// Wall-clock construction time, stored in whole milliseconds.
    pub duration: Duration,
}

impl GraphInfo {
    /// Describes `index` without benchmarking figures.
    #[must_use]
    pub fn from_index<S: VectorStore + ?Sized>(index: &Hnsw<'_, S>) -> Self {
        let params = index.params();
        Self {
            optimal_connections: params.optimal_connections(),
            max_connections: params.max_connections(),
            max_connections_0: params.max_connections_0(),
            ef_construction: params.ef_construction(),
            num_nodes: index.len(),
            num_layers: index.num_layers(),
            benchmark: None,
        }
    }

    /// Appends construction cost, producing the benchmarking variant.
    #[must_use]
    pub fn with_benchmark(mut self, tally: DistanceTally, duration: Duration) -> Self {
        self.benchmark = Some(BuildReport { tally, duration });
        self
    }

    /// Writes the sidecar text.
    ///
    /// # Errors
    /// Returns [`PersistError::Io`] when the writer fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), PersistError> {
        writeln!(
            writer,
            "{} {} {} {}",
            self.optimal_connections,
            self.max_connections,
            self.max_connections_0,
            self.ef_construction
        )?;
        writeln!(writer, "{}", self.num_nodes)?;
        writeln!(writer, "{}", self.num_layers)?;
        if let Some(report) = self.benchmark {
            writeln!(writer, "{}", report.tally.layer0())?;
            writeln!(writer, "{}", report.tally.upper())?;
            writeln!(writer, "{}", report.duration.as_millis())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Parses sidecar text in either variant.
    ///
    /// # Errors
    /// Returns [`PersistError::Format`] for missing or non-numeric fields.
    ///
    /// # Examples
    /// ```
    /// use navgraph_core::GraphInfo;
    ///
    /// let info = GraphInfo::parse("4 4 8 10\n20\n2\n")?;
    /// assert_eq!(info.max_connections_0, 8);
    /// assert_eq!(info.num_layers, 2);
    /// assert!(info.benchmark.is_none());
    /// # Ok::<(), navgraph_core::PersistError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self, PersistError> {
        const NAMES: [&str; 9] = [
            "optimal_connections",
            "max_connections",
            "max_connections_0",
            "ef_construction",
            "num_nodes",
            "num_layers",
            "layer0_distance_comparisons",
            "upper_layer_distance_comparisons",
            "construction_duration_ms",
        ];
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != 6 && fields.len() != NAMES.len() {
            return Err(PersistError::format(format!(
                "sidecar must hold 6 or {} fields, found {}",
                NAMES.len(),
                fields.len()
            )));
        }
        let values = fields
            .iter()
            .zip(NAMES)
            .map(|(raw, name)| {
                raw.parse::<u64>().map_err(|_| {
                    PersistError::format(format!("sidecar {name} is not a count: {raw:?}"))
                })
            })
            .collect::<Result<Vec<u64>, _>>()?;
        let count = |index: usize| -> Result<usize, PersistError> {
            let value = values.get(index).copied().unwrap_or_default();
            usize::try_from(value).map_err(|_| {
                PersistError::format(format!("sidecar {} overflows: {value}", NAMES[index]))
            })
        };

        let benchmark = match values.as_slice() {
            [.., layer0, upper, millis] if values.len() == NAMES.len() => Some(BuildReport {
                tally: DistanceTally::from_counts(*layer0, *upper),
                duration: Duration::from_millis(*millis),
            }),
            _ => None,
        };
        Ok(Self {
            optimal_connections: count(0)?,
            max_connections: count(1)?,
            max_connections_0: count(2)?,
            ef_construction: count(3)?,
            num_nodes: count(4)?,
            num_layers: count(5)?,
            benchmark,
        })
    }

    /// Rejects any difference between stored and active construction
    /// parameters or node counts.
    ///
    /// # Errors
    /// Returns [`PersistError::ParameterMismatch`] or
    /// [`PersistError::NodeCountMismatch`] naming the first difference.
    pub fn ensure_matches(&self, params: &HnswParams, nodes: usize) -> Result<(), PersistError> {
        let checks = [
            ("optimal_connections", self.optimal_connections, params.optimal_connections()),
            ("max_connections", self.max_connections, params.max_connections()),
            ("max_connections_0", self.max_connections_0, params.max_connections_0()),
            ("ef_construction", self.ef_construction, params.ef_construction()),
        ];
        for (field, stored, active) in checks {
            if stored != active {
                error!(field, stored, active, "stored graph parameter mismatch");
                return Err(PersistError::ParameterMismatch {
                    field,
                    stored,
                    active,
                });
            }
        }
        if self.num_nodes != nodes {
            error!(
                stored = self.num_nodes,
                active = nodes,
                "stored graph node count mismatch"
            );
            return Err(PersistError::NodeCountMismatch {
                stored: self.num_nodes,
                active: nodes,
            });
        }
        Ok(())
    }
}

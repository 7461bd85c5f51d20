use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::warn;
use recon_core::errors::{ErrorInfo, ReconError};
use recon_stat::{cdf_branch, fraction_at_or_below, max_ratio, percentile, CdfBranch, RatioKind};
use serde::{Deserialize, Serialize};

use crate::entity::EntityRecord;
use crate::schema::{ColumnSpec, EvaluationKind, ScalarSpec, SchemaDescriptor, SortKey, SummaryStat};

/// Single value of the exported table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Cell {
    /// Textual value (identifiers, labels).
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Explicitly absent value.
    Missing,
}

impl Cell {
    fn number(value: f64) -> Self {
        if value.is_nan() {
            Cell::Missing
        } else {
            Cell::Number(value)
        }
    }

    /// Numeric payload, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns true for [`Cell::Missing`].
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

/// One entity of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Entity identifier.
    pub id: String,
    /// Cells in column order.
    pub cells: Vec<Cell>,
}

/// Outlier list of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name inside the output folder.
    pub file_name: String,
    /// Outliers in sample order.
    pub values: Vec<f64>,
}

/// Ordered table over a fixed column enumeration plus dataset-level scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Evaluation the dataset belongs to.
    pub kind: EvaluationKind,
    /// Column headers in export order.
    pub columns: Vec<String>,
    /// Rows in their final order.
    pub rows: Vec<Row>,
    /// Dataset-level scalars.
    pub scalars: BTreeMap<String, f64>,
    /// Rendering branch of the ratio CDF, for evaluations with a ratio column.
    pub branch: Option<CdfBranch>,
    /// Per-entity side files.
    pub attachments: Vec<Attachment>,
}

fn strip_digits(id: &str) -> String {
    id.chars().filter(|c| !c.is_ascii_digit()).collect()
}

fn cell_for(record: &EntityRecord, column: &ColumnSpec) -> Cell {
    match column {
        ColumnSpec::Id { .. } => Cell::Text(record.id.clone()),
        ColumnSpec::Label { .. } => Cell::Text(strip_digits(&record.id)),
        ColumnSpec::Ideal { .. } => record.ideal.map_or(Cell::Missing, Cell::number),
        ColumnSpec::Scalar { header } => record
            .scalars
            .get(header)
            .copied()
            .map_or(Cell::Missing, Cell::number),
        ColumnSpec::Stat { strategy, stat, .. } => {
            let value = match stat {
                SummaryStat::Mean => record.means.get(strategy).copied(),
                SummaryStat::Quantile(probability) => record
                    .summaries
                    .get(strategy)
                    .map(|summary| summary.quantile(*probability)),
                SummaryStat::WhiskerLow => record.summaries.get(strategy).map(|s| s.whisker_low),
                SummaryStat::WhiskerHigh => {
                    record.summaries.get(strategy).map(|s| s.whisker_high)
                }
            };
            value.map_or(Cell::Missing, Cell::number)
        }
        ColumnSpec::Ratio { header } => record
            .comparisons
            .get(header)
            .map_or(Cell::Missing, |metric| Cell::number(metric.ratio.value)),
        // Positional columns are filled once the order is final.
        ColumnSpec::RowIndex { .. } | ColumnSpec::Position { .. } => Cell::Missing,
    }
}

/// Missing values sort last in both directions.
fn compare_cells(a: &Cell, b: &Cell, ascending: bool) -> Ordering {
    let ordering = match (a, b) {
        (Cell::Missing, Cell::Missing) => return Ordering::Equal,
        (Cell::Missing, _) => return Ordering::Greater,
        (_, Cell::Missing) => return Ordering::Less,
        (Cell::Number(x), Cell::Number(y)) => x.total_cmp(y),
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        (Cell::Number(_), Cell::Text(_)) => Ordering::Less,
        (Cell::Text(_), Cell::Number(_)) => Ordering::Greater,
    };
    if ascending {
        ordering
    } else {
        ordering.reverse()
    }
}

impl Dataset {
    /// Joins per-entity summaries into one ordered table.
    ///
    /// Rows start in discovery order and are stably sorted on `sort`, so ties
    /// keep discovery order. Positional columns are computed after sorting.
    pub fn assemble(
        kind: EvaluationKind,
        mut records: Vec<EntityRecord>,
        columns: &[ColumnSpec],
        sort: Option<&SortKey>,
    ) -> Result<Self, ReconError> {
        records.sort_by_key(|record| record.discovery);
        let mut rows: Vec<Row> = records
            .iter()
            .map(|record| Row {
                id: record.id.clone(),
                cells: columns.iter().map(|column| cell_for(record, column)).collect(),
            })
            .collect();

        if let Some(key) = sort {
            let idx = columns
                .iter()
                .position(|column| column.header() == key.column)
                .ok_or_else(|| {
                    ReconError::Config(
                        ErrorInfo::new("unknown_sort_column", "sort key is not a column")
                            .with_context("column", key.column.clone()),
                    )
                })?;
            rows.sort_by(|a, b| compare_cells(&a.cells[idx], &b.cells[idx], key.ascending));
        }

        for (position, row) in rows.iter_mut().enumerate() {
            for (cell, column) in row.cells.iter_mut().zip(columns) {
                match column {
                    ColumnSpec::RowIndex { .. } => *cell = Cell::Number(position as f64),
                    ColumnSpec::Position { step, .. } => {
                        *cell = Cell::Number(position as f64 * step)
                    }
                    _ => {}
                }
            }
        }

        Ok(Self {
            kind,
            columns: columns.iter().map(|column| column.header().to_string()).collect(),
            rows,
            scalars: BTreeMap::new(),
            branch: None,
            attachments: Vec::new(),
        })
    }

    /// Builds the complete dataset of an evaluation: columns, order, scalars
    /// and attachments.
    pub fn from_descriptor(
        descriptor: &SchemaDescriptor,
        records: Vec<EntityRecord>,
    ) -> Result<Self, ReconError> {
        let columns = resolve_columns(descriptor, &records);
        let both_zero = both_zero_counts(descriptor, &records);
        let mut dataset = Self::assemble(
            descriptor.kind,
            records.clone(),
            &columns,
            descriptor.sort.as_ref(),
        )?;

        for scalar in &descriptor.scalars {
            dataset.apply_scalar(scalar, &both_zero)?;
        }

        if let Some(attachment) = &descriptor.attachment {
            let by_id: BTreeMap<&str, &EntityRecord> =
                records.iter().map(|record| (record.id.as_str(), record)).collect();
            dataset.attachments = dataset
                .rows
                .iter()
                .filter_map(|row| by_id.get(row.id.as_str()))
                .map(|record| Attachment {
                    file_name: format!("{}{}", record.id, attachment.suffix),
                    values: record
                        .summaries
                        .get(&attachment.strategy)
                        .map(|summary| summary.outliers.clone())
                        .unwrap_or_default(),
                })
                .collect();
        }
        Ok(dataset)
    }

    /// Index of `header` in the column enumeration.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == header)
    }

    /// Defined numeric values of a column, in row order.
    pub fn column_values(&self, header: &str) -> Result<Vec<f64>, ReconError> {
        let idx = self.column_index(header).ok_or_else(|| {
            ReconError::Config(
                ErrorInfo::new("unknown_column", "scalar refers to an unknown column")
                    .with_context("column", header),
            )
        })?;
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.cells[idx].as_f64())
            .collect())
    }

    fn apply_scalar(
        &mut self,
        scalar: &ScalarSpec,
        both_zero: &BTreeMap<String, usize>,
    ) -> Result<(), ReconError> {
        match scalar {
            ScalarSpec::RatioSummary { column } => {
                let ratios = self.column_values(column)?;
                self.scalars.insert(
                    "fraction_less_equal_one".to_string(),
                    fraction_at_or_below(&ratios, 1.0),
                );
                let max = max_ratio(&ratios);
                if !max.is_nan() {
                    self.scalars.insert("max_ratio".to_string(), max);
                }
                self.scalars.insert(
                    "both_zero_count".to_string(),
                    both_zero.get(column).copied().unwrap_or(0) as f64,
                );
                self.branch = Some(cdf_branch(&ratios));
            }
            ScalarSpec::FractionAtOrBelow {
                name,
                column,
                threshold,
            } => {
                let values = self.column_values(column)?;
                self.scalars
                    .insert(name.clone(), fraction_at_or_below(&values, *threshold));
            }
            ScalarSpec::ColumnMedian { name, column } => {
                let mut values = self.column_values(column)?;
                if values.is_empty() {
                    warn!("{name}: column {column} has no value");
                } else {
                    values.sort_by(f64::total_cmp);
                    self.scalars.insert(name.clone(), percentile(&values, 0.5));
                }
            }
            ScalarSpec::ColumnSum { name, column } => {
                let total = self.column_values(column)?.iter().sum();
                self.scalars.insert(name.clone(), total);
            }
        }
        Ok(())
    }
}

/// Fixed columns plus, for evaluations without declared strategies, one mean
/// column per strategy discovered in the data.
fn resolve_columns(descriptor: &SchemaDescriptor, records: &[EntityRecord]) -> Vec<ColumnSpec> {
    let mut columns = descriptor.columns.clone();
    if descriptor.strategies.is_empty() {
        let mut ordered: Vec<&EntityRecord> = records.iter().collect();
        ordered.sort_by_key(|record| record.discovery);
        let mut seen: Vec<&str> = Vec::new();
        for record in ordered {
            for label in record.summaries.keys() {
                if !seen.contains(&label.as_str()) {
                    seen.push(label);
                }
            }
        }
        columns.extend(seen.into_iter().map(ColumnSpec::mean));
    }
    columns
}

fn both_zero_counts(
    descriptor: &SchemaDescriptor,
    records: &[EntityRecord],
) -> BTreeMap<String, usize> {
    descriptor
        .comparisons
        .iter()
        .map(|spec| {
            let count = records
                .iter()
                .filter(|record| {
                    record
                        .comparisons
                        .get(&spec.name)
                        .map_or(false, |metric| metric.ratio.kind == RatioKind::BothZero)
                })
                .count();
            (spec.name.clone(), count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use recon_stat::{summarize, Sample};

    use super::*;

    fn record(id: &str, discovery: usize, median: f64) -> EntityRecord {
        let summary = summarize(&Sample::new(vec![median])).expect("summary");
        let mut summaries = IndexMap::new();
        summaries.insert("random".to_string(), summary);
        EntityRecord {
            id: id.to_string(),
            discovery,
            ideal: None,
            summaries,
            means: IndexMap::new(),
            scalars: BTreeMap::new(),
            comparisons: BTreeMap::new(),
        }
    }

    fn ids(dataset: &Dataset) -> Vec<&str> {
        dataset.rows.iter().map(|row| row.id.as_str()).collect()
    }

    #[test]
    fn stable_sort_keeps_discovery_order_on_ties() {
        let columns = vec![ColumnSpec::id("network"), ColumnSpec::median("random")];
        let sort = SortKey {
            column: "random".to_string(),
            ascending: true,
        };
        let dataset = Dataset::assemble(
            EvaluationKind::CostComparison(6),
            vec![record("A", 0, 50.0), record("B", 1, 30.0), record("C", 2, 30.0)],
            &columns,
            Some(&sort),
        )
        .expect("dataset");
        assert_eq!(ids(&dataset), ["B", "C", "A"]);
    }

    #[test]
    fn missing_sort_values_go_last() {
        let columns = vec![ColumnSpec::id("network"), ColumnSpec::median("random")];
        let mut undefined = record("U", 0, 1.0);
        undefined.summaries.clear();
        for ascending in [true, false] {
            let sort = SortKey {
                column: "random".to_string(),
                ascending,
            };
            let dataset = Dataset::assemble(
                EvaluationKind::SchedulingTime,
                vec![undefined.clone(), record("A", 1, 2.0), record("B", 2, 1.0)],
                &columns,
                Some(&sort),
            )
            .expect("dataset");
            assert_eq!(dataset.rows[2].id, "U");
            assert!(dataset.rows[2].cells[1].is_missing());
        }
    }

    #[test]
    fn positions_follow_final_order() {
        let columns = vec![
            ColumnSpec::RowIndex {
                header: "idx".to_string(),
            },
            ColumnSpec::id("topology"),
            ColumnSpec::Position {
                header: "y_pos".to_string(),
                step: 1.5,
            },
        ];
        let sort = SortKey {
            column: "topology".to_string(),
            ascending: false,
        };
        let dataset = Dataset::assemble(
            EvaluationKind::CostBoxplot,
            vec![record("Abilene", 0, 1.0), record("Zib54", 1, 1.0)],
            &columns,
            Some(&sort),
        )
        .expect("dataset");
        assert_eq!(ids(&dataset), ["Zib54", "Abilene"]);
        assert_eq!(dataset.rows[1].cells[0], Cell::Number(1.0));
        assert_eq!(dataset.rows[1].cells[2], Cell::Number(1.5));
    }

    #[test]
    fn unknown_sort_column_is_config_error() {
        let sort = SortKey {
            column: "nope".to_string(),
            ascending: true,
        };
        let err = Dataset::assemble(
            EvaluationKind::SchedulingTime,
            vec![record("A", 0, 1.0)],
            &[ColumnSpec::id("network")],
            Some(&sort),
        )
        .expect_err("unknown column");
        assert!(matches!(err, ReconError::Config(_)));
    }

    #[test]
    fn label_strips_digits() {
        assert_eq!(strip_digits("Cogentco2011"), "Cogentco");
    }
}

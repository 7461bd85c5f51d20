use std::fmt::{self, Display};
use std::str::FromStr;

use recon_core::errors::{ErrorInfo, ReconError};
use recon_stat::Probability;
use serde::{Deserialize, Serialize};

/// Evaluations produced by the benchmark, one per figure or table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationKind {
    /// Error rate CDF of the random orderings (evaluation 1).
    ErrorRate,
    /// Cost boxplot of random permutations per topology (evaluation 2).
    CostBoxplot,
    /// Scheduling time versus number of commands (evaluation 3).
    SchedulingTime,
    /// Mean scheduling time versus problem complexity (evaluation 5).
    Complexity,
    /// Cost comparison against the random and MIF/MIL baselines (evaluations 6, 7, 8).
    CostComparison(u8),
    /// Explored states per network (evaluation 9).
    StateExploration,
    /// Classifier confusion counts (evaluation 10).
    Classification,
    /// Transmitted versus dropped packets (evaluation 11).
    PacketLoss,
}

impl EvaluationKind {
    /// Every evaluation, in numeric order.
    pub const ALL: [EvaluationKind; 10] = [
        EvaluationKind::ErrorRate,
        EvaluationKind::CostBoxplot,
        EvaluationKind::SchedulingTime,
        EvaluationKind::Complexity,
        EvaluationKind::CostComparison(6),
        EvaluationKind::CostComparison(7),
        EvaluationKind::CostComparison(8),
        EvaluationKind::StateExploration,
        EvaluationKind::Classification,
        EvaluationKind::PacketLoss,
    ];

    /// Numeric evaluation identifier.
    pub fn id(self) -> u8 {
        match self {
            EvaluationKind::ErrorRate => 1,
            EvaluationKind::CostBoxplot => 2,
            EvaluationKind::SchedulingTime => 3,
            EvaluationKind::Complexity => 5,
            EvaluationKind::CostComparison(id) => id,
            EvaluationKind::StateExploration => 9,
            EvaluationKind::Classification => 10,
            EvaluationKind::PacketLoss => 11,
        }
    }

    /// Directory holding the results of this evaluation.
    pub fn result_dir_name(self) -> String {
        format!("result_{}", self.id())
    }

    /// Declarative descriptor driving the generic pipeline.
    pub fn descriptor(self) -> SchemaDescriptor {
        match self {
            EvaluationKind::ErrorRate => error_rate(),
            EvaluationKind::CostBoxplot => cost_boxplot(),
            EvaluationKind::SchedulingTime => scheduling_time(),
            EvaluationKind::Complexity => complexity(),
            EvaluationKind::CostComparison(id) => cost_comparison(id),
            EvaluationKind::StateExploration => state_exploration(),
            EvaluationKind::Classification => classification(),
            EvaluationKind::PacketLoss => packet_loss(),
        }
    }
}

impl Display for EvaluationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for EvaluationKind {
    type Err = ReconError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim().trim_start_matches("result_");
        let kind = match trimmed {
            "1" => EvaluationKind::ErrorRate,
            "2" => EvaluationKind::CostBoxplot,
            "3" => EvaluationKind::SchedulingTime,
            "5" => EvaluationKind::Complexity,
            "6" => EvaluationKind::CostComparison(6),
            "7" => EvaluationKind::CostComparison(7),
            "8" => EvaluationKind::CostComparison(8),
            "9" => EvaluationKind::StateExploration,
            "10" => EvaluationKind::Classification,
            "11" => EvaluationKind::PacketLoss,
            _ => {
                return Err(ReconError::Config(
                    ErrorInfo::new("unknown_evaluation", format!("unknown evaluation {raw}"))
                        .with_hint("expected one of 1, 2, 3, 5, 6, 7, 8, 9, 10, 11"),
                ))
            }
        };
        Ok(kind)
    }
}

/// What to do with a file that fails to parse or validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilePolicy {
    /// Log a warning and continue with the remaining files.
    SkipAndWarn,
    /// Abort the run, naming the offending file.
    Abort,
}

/// What to do with a strategy sample that contains missing results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingPolicy {
    /// Exclude the whole entity from the evaluation.
    DropEntity,
    /// The strategy must always converge: abort the run.
    Abort,
    /// Keep the entity with an undefined summary for this strategy.
    Undefined,
}

/// Whether the loader parses files as JSON or hands over raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputFormat {
    /// Structured JSON record.
    Json,
    /// Plain text log.
    Text,
}

/// Location of a strategy's sample inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleSource {
    /// `key` holds an array of objects, each contributing its `field`.
    RecordField {
        /// Top-level key of the result array.
        key: String,
        /// Numeric field read from every element.
        field: String,
    },
    /// JSON pointer to an array of numbers.
    ValueArray {
        /// JSON pointer (RFC 6901).
        pointer: String,
    },
}

impl SampleSource {
    fn record_field(key: &str, field: &str) -> Self {
        SampleSource::RecordField {
            key: key.to_string(),
            field: field.to_string(),
        }
    }

    /// JSON pointer of the container the sample is read from.
    pub fn pointer(&self) -> String {
        match self {
            SampleSource::RecordField { key, .. } => format!("/{key}"),
            SampleSource::ValueArray { pointer } => pointer.clone(),
        }
    }
}

/// One competing strategy of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySpec {
    /// Label used in column names.
    pub label: String,
    /// Where the sample is read from.
    pub source: SampleSource,
    /// Policy applied when the sample contains missing results.
    pub missing: MissingPolicy,
    /// Restricts the strategy to files with this suffix; the entity id is the
    /// file name without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_suffix: Option<String>,
}

impl StrategySpec {
    fn new(label: &str, source: SampleSource, missing: MissingPolicy) -> Self {
        Self {
            label: label.to_string(),
            source,
            missing,
            file_suffix: None,
        }
    }

    fn from_file(mut self, suffix: &str) -> Self {
        self.file_suffix = Some(suffix.to_string());
        self
    }
}

/// Statistic of a strategy summary exposed as a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStat {
    /// One of the five summary quantiles.
    Quantile(Probability),
    /// Lower boxplot whisker.
    WhiskerLow,
    /// Upper boxplot whisker.
    WhiskerHigh,
    /// Arithmetic mean of the sample.
    Mean,
}

/// Column of the exported dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum ColumnSpec {
    /// Entity identifier.
    Id {
        /// Column header.
        header: String,
    },
    /// Entity identifier with digits stripped.
    Label {
        /// Column header.
        header: String,
    },
    /// Ideal reference value.
    Ideal {
        /// Column header.
        header: String,
    },
    /// Named entity scalar; the header doubles as the scalar name.
    Scalar {
        /// Column header.
        header: String,
    },
    /// Statistic of one strategy summary.
    Stat {
        /// Column header.
        header: String,
        /// Strategy label.
        strategy: String,
        /// Statistic read from the summary.
        stat: SummaryStat,
    },
    /// Ratio produced by the named comparison.
    Ratio {
        /// Column header, equal to the comparison name.
        header: String,
    },
    /// Zero-based row position after sorting.
    RowIndex {
        /// Column header.
        header: String,
    },
    /// Row position after sorting, scaled by `step`.
    Position {
        /// Column header.
        header: String,
        /// Distance between consecutive rows.
        step: f64,
    },
}

impl ColumnSpec {
    /// Header used in the exported table.
    pub fn header(&self) -> &str {
        match self {
            ColumnSpec::Id { header }
            | ColumnSpec::Label { header }
            | ColumnSpec::Ideal { header }
            | ColumnSpec::Scalar { header }
            | ColumnSpec::Stat { header, .. }
            | ColumnSpec::Ratio { header }
            | ColumnSpec::RowIndex { header }
            | ColumnSpec::Position { header, .. } => header,
        }
    }

    pub(crate) fn id(header: &str) -> Self {
        ColumnSpec::Id {
            header: header.to_string(),
        }
    }

    fn scalar(header: &str) -> Self {
        ColumnSpec::Scalar {
            header: header.to_string(),
        }
    }

    fn stat(header: &str, strategy: &str, stat: SummaryStat) -> Self {
        ColumnSpec::Stat {
            header: header.to_string(),
            strategy: strategy.to_string(),
            stat,
        }
    }

    /// Median of a strategy, named after the strategy.
    pub fn median(strategy: &str) -> Self {
        Self::stat(strategy, strategy, SummaryStat::Quantile(Probability::P50))
    }

    /// Mean of a strategy, named after the strategy.
    pub fn mean(strategy: &str) -> Self {
        Self::stat(strategy, strategy, SummaryStat::Mean)
    }

    /// `<strategy>_05 ... <strategy>_95` columns.
    pub fn quantiles(strategy: &str) -> Vec<Self> {
        Probability::ALL
            .iter()
            .map(|probability| {
                Self::stat(
                    &format!("{strategy}_{}", probability.suffix()),
                    strategy,
                    SummaryStat::Quantile(*probability),
                )
            })
            .collect()
    }
}

/// Candidate-versus-baseline comparison computed for every entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSpec {
    /// Name of the comparison and of its ratio column.
    pub name: String,
    /// Baseline strategy label.
    pub baseline: String,
    /// Candidate strategy label.
    pub candidate: String,
}

/// Declared row order of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Header of the column to sort on.
    pub column: String,
    /// Ascending when true.
    pub ascending: bool,
}

impl SortKey {
    fn ascending(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: true,
        }
    }

    fn descending(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: false,
        }
    }
}

/// Dataset-level scalar derived from a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scalar", rename_all = "kebab-case")]
pub enum ScalarSpec {
    /// `fraction_less_equal_one`, `max_ratio`, `both_zero_count` and the CDF branch.
    RatioSummary {
        /// Ratio column.
        column: String,
    },
    /// Empirical CDF of a column at a threshold.
    FractionAtOrBelow {
        /// Scalar name.
        name: String,
        /// Source column.
        column: String,
        /// Threshold.
        threshold: f64,
    },
    /// Median of a column across entities.
    ColumnMedian {
        /// Scalar name.
        name: String,
        /// Source column.
        column: String,
    },
    /// Sum of a column across entities.
    ColumnSum {
        /// Scalar name.
        name: String,
        /// Source column.
        column: String,
    },
}

/// Per-entity side file listing the outliers of one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSpec {
    /// Strategy whose outliers are listed.
    pub strategy: String,
    /// File name suffix appended to the entity identifier.
    pub suffix: String,
}

/// Declarative description of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Evaluation described.
    pub kind: EvaluationKind,
    /// Input format of every file.
    pub format: InputFormat,
    /// Glob patterns selecting input files.
    pub file_patterns: Vec<String>,
    /// Names that are never read (output folders).
    pub reserved: Vec<String>,
    /// JSON pointers every record must contain.
    pub required_keys: Vec<String>,
    /// Strategies compared by the evaluation.
    pub strategies: Vec<StrategySpec>,
    /// Missing-value policy for strategies discovered from the data.
    pub default_missing: MissingPolicy,
    /// JSON pointer of the ideal reference value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideal: Option<String>,
    /// Entity scalars read from every record: (name, JSON pointer).
    pub entity_scalars: Vec<(String, String)>,
    /// Comparisons computed per entity.
    pub comparisons: Vec<ComparisonSpec>,
    /// Fixed column enumeration.
    pub columns: Vec<ColumnSpec>,
    /// Row order; discovery order when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
    /// Dataset-level scalars.
    pub scalars: Vec<ScalarSpec>,
    /// Optional per-entity outlier files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentSpec>,
    /// Policy for unreadable or invalid files.
    pub file_policy: FilePolicy,
    /// Output subfolder recreated on every run.
    pub output_dir: String,
    /// File name of the tabular blob.
    pub data_file: String,
}

impl SchemaDescriptor {
    fn new(kind: EvaluationKind, patterns: &[&str]) -> Self {
        Self {
            kind,
            format: InputFormat::Json,
            file_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            reserved: vec!["plot".to_string(), "table".to_string()],
            required_keys: Vec::new(),
            strategies: Vec::new(),
            default_missing: MissingPolicy::DropEntity,
            ideal: None,
            entity_scalars: Vec::new(),
            comparisons: Vec::new(),
            columns: Vec::new(),
            sort: None,
            scalars: Vec::new(),
            attachment: None,
            file_policy: FilePolicy::Abort,
            output_dir: "plot".to_string(),
            data_file: "data.csv".to_string(),
        }
    }

    fn required(mut self, keys: &[&str]) -> Self {
        self.required_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Strategy descriptor for `label`, if declared.
    pub fn strategy(&self, label: &str) -> Option<&StrategySpec> {
        self.strategies.iter().find(|spec| spec.label == label)
    }

    /// Missing-value policy for `label`, falling back to [`SchemaDescriptor::default_missing`].
    pub fn missing_policy(&self, label: &str) -> MissingPolicy {
        self.strategy(label)
            .map(|spec| spec.missing)
            .unwrap_or(self.default_missing)
    }

    /// Column headers in export order.
    pub fn headers(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.header().to_string())
            .collect()
    }
}

fn error_rate() -> SchemaDescriptor {
    let mut descriptor = SchemaDescriptor::new(EvaluationKind::ErrorRate, &["*"]);
    descriptor.file_policy = FilePolicy::SkipAndWarn;
    for name in [
        "random_permutations",
        "random_router_order",
        "insert_before_order",
    ] {
        descriptor.columns.push(ColumnSpec::scalar(name));
        descriptor.scalars.push(ScalarSpec::ColumnMedian {
            name: format!("{name}_median"),
            column: name.to_string(),
        });
    }
    descriptor
}

fn cost_boxplot() -> SchemaDescriptor {
    let mut descriptor = SchemaDescriptor::new(EvaluationKind::CostBoxplot, &["*.gml.json"])
        .required(&["/0/random_permutations/cost/values", "/0/ideal_cost"]);
    descriptor.strategies.push(StrategySpec::new(
        "random",
        SampleSource::ValueArray {
            pointer: "/0/random_permutations/cost/values".to_string(),
        },
        // A box missing from the figure would go unnoticed.
        MissingPolicy::Abort,
    ));
    descriptor.ideal = Some("/0/ideal_cost".to_string());
    descriptor.columns = vec![
        ColumnSpec::id("topology"),
        ColumnSpec::Label {
            header: "name".to_string(),
        },
        ColumnSpec::Position {
            header: "y_pos".to_string(),
            step: 1.5,
        },
        ColumnSpec::Ideal {
            header: "ideal".to_string(),
        },
        ColumnSpec::stat("lower_whisker", "random", SummaryStat::WhiskerLow),
        ColumnSpec::stat(
            "lower_quartile",
            "random",
            SummaryStat::Quantile(Probability::P25),
        ),
        ColumnSpec::stat("median", "random", SummaryStat::Quantile(Probability::P50)),
        ColumnSpec::stat(
            "upper_quartile",
            "random",
            SummaryStat::Quantile(Probability::P75),
        ),
        ColumnSpec::stat("upper_whisker", "random", SummaryStat::WhiskerHigh),
    ];
    descriptor.sort = Some(SortKey::descending("topology"));
    descriptor.attachment = Some(AttachmentSpec {
        strategy: "random".to_string(),
        suffix: "_fliers.csv".to_string(),
    });
    descriptor
}

fn scheduling_time() -> SchemaDescriptor {
    let mut descriptor = SchemaDescriptor::new(EvaluationKind::SchedulingTime, &["*json"])
        .required(&[
            "/num_commands",
            "/tree_result",
            "/strategy_result",
            "/random_result",
        ]);
    descriptor.file_policy = FilePolicy::SkipAndWarn;
    descriptor.strategies = vec![
        // The random baseline may give up entirely; keep the row with an empty cell.
        StrategySpec::new(
            "random",
            SampleSource::record_field("random_result", "time"),
            MissingPolicy::Undefined,
        ),
        StrategySpec::new(
            "tree",
            SampleSource::record_field("tree_result", "time"),
            MissingPolicy::DropEntity,
        ),
        StrategySpec::new(
            "snowcap",
            SampleSource::record_field("strategy_result", "time"),
            MissingPolicy::DropEntity,
        ),
    ];
    descriptor.entity_scalars = vec![("x".to_string(), "/num_commands".to_string())];
    descriptor.columns = vec![
        ColumnSpec::scalar("x"),
        ColumnSpec::median("random"),
        ColumnSpec::median("tree"),
        ColumnSpec::median("snowcap"),
    ];
    descriptor.sort = Some(SortKey::ascending("x"));
    descriptor
}

fn complexity() -> SchemaDescriptor {
    let mut descriptor = SchemaDescriptor::new(EvaluationKind::Complexity, &["r*_v*.json"])
        .required(&["/num_commands", "/strategy_result"]);
    // Strategy columns (`c<num_commands>`) are discovered from the data.
    descriptor.default_missing = MissingPolicy::DropEntity;
    descriptor.columns = vec![ColumnSpec::scalar("complexity")];
    descriptor.sort = Some(SortKey::ascending("complexity"));
    descriptor
}

fn cost_comparison(id: u8) -> SchemaDescriptor {
    let mut descriptor =
        SchemaDescriptor::new(EvaluationKind::CostComparison(id), &["*.json"]).required(&[
            "/random_result",
            "/strategy_result",
            "/baseline_mif_result",
            "/baseline_mil_result",
            "/ideal_cost",
        ]);
    // The random and MIF/MIL baselines may fail to find any valid ordering;
    // such networks are excluded. The target strategy must always succeed.
    descriptor.strategies = vec![
        StrategySpec::new(
            "random",
            SampleSource::record_field("random_result", "cost"),
            MissingPolicy::DropEntity,
        ),
        StrategySpec::new(
            "mif",
            SampleSource::record_field("baseline_mif_result", "cost"),
            MissingPolicy::DropEntity,
        ),
        StrategySpec::new(
            "mil",
            SampleSource::record_field("baseline_mil_result", "cost"),
            MissingPolicy::DropEntity,
        ),
        StrategySpec::new(
            "snowcap",
            SampleSource::record_field("strategy_result", "cost"),
            MissingPolicy::Abort,
        ),
    ];
    descriptor.ideal = Some("/ideal_cost".to_string());
    descriptor.comparisons = vec![ComparisonSpec {
        name: "fraction".to_string(),
        baseline: "random".to_string(),
        candidate: "snowcap".to_string(),
    }];
    // `pos` is the x axis of every quantile series in the rendered figure.
    descriptor.columns = vec![
        ColumnSpec::RowIndex {
            header: "pos".to_string(),
        },
        ColumnSpec::id("network"),
        ColumnSpec::Ideal {
            header: "optimal".to_string(),
        },
        ColumnSpec::Ratio {
            header: "fraction".to_string(),
        },
    ];
    for strategy in ["random", "mif", "mil", "snowcap"] {
        descriptor.columns.extend(ColumnSpec::quantiles(strategy));
    }
    descriptor.sort = Some(SortKey::ascending("random_50"));
    descriptor.scalars = vec![
        ScalarSpec::RatioSummary {
            column: "fraction".to_string(),
        },
        ScalarSpec::FractionAtOrBelow {
            name: "mid_point".to_string(),
            column: "fraction".to_string(),
            threshold: 0.5,
        },
        ScalarSpec::FractionAtOrBelow {
            name: "zero_point".to_string(),
            column: "fraction".to_string(),
            threshold: 0.0,
        },
    ];
    descriptor
}

fn state_exploration() -> SchemaDescriptor {
    let mut descriptor = SchemaDescriptor::new(
        EvaluationKind::StateExploration,
        &["*.gml.rand.json", "*.gml.strat.json", "*.gml.optim.json"],
    );
    descriptor.strategies = vec![
        StrategySpec::new(
            "random",
            SampleSource::record_field("random_result", "num_states"),
            MissingPolicy::DropEntity,
        )
        .from_file(".gml.rand.json"),
        StrategySpec::new(
            "optimizer",
            SampleSource::record_field("strategy_result", "num_states"),
            MissingPolicy::DropEntity,
        )
        .from_file(".gml.optim.json"),
        StrategySpec::new(
            "strategy",
            SampleSource::record_field("strategy_result", "num_states"),
            MissingPolicy::DropEntity,
        )
        .from_file(".gml.strat.json"),
    ];
    descriptor.columns = vec![
        ColumnSpec::RowIndex {
            header: "idx".to_string(),
        },
        ColumnSpec::id("network"),
    ];
    for strategy in ["random", "optimizer", "strategy"] {
        descriptor.columns.extend(ColumnSpec::quantiles(strategy));
    }
    descriptor.sort = Some(SortKey::ascending("strategy_50"));
    descriptor
}

fn classification() -> SchemaDescriptor {
    let mut descriptor = SchemaDescriptor::new(EvaluationKind::Classification, &["raw_output"]);
    descriptor.format = InputFormat::Text;
    descriptor.columns = vec![
        ColumnSpec::id("outcome"),
        ColumnSpec::scalar("count"),
        ColumnSpec::scalar("rate"),
    ];
    descriptor.scalars = vec![ScalarSpec::ColumnSum {
        name: "total".to_string(),
        column: "count".to_string(),
    }];
    descriptor.output_dir = "table".to_string();
    descriptor.data_file = "table.csv".to_string();
    descriptor
}

fn packet_loss() -> SchemaDescriptor {
    let mut descriptor =
        SchemaDescriptor::new(EvaluationKind::PacketLoss, &["random.json", "snowcap.json"]);
    descriptor.columns = vec![
        ColumnSpec::id("strategy"),
        ColumnSpec::scalar("transmitted"),
        ColumnSpec::scalar("dropped"),
        ColumnSpec::scalar("transmitted_rate"),
        ColumnSpec::scalar("dropped_rate"),
        ColumnSpec::scalar("time"),
    ];
    descriptor.output_dir = "table".to_string();
    descriptor.data_file = "table.csv".to_string();
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_identifiers() {
        assert_eq!(
            "7".parse::<EvaluationKind>().expect("kind"),
            EvaluationKind::CostComparison(7)
        );
        assert_eq!(
            "result_9".parse::<EvaluationKind>().expect("kind"),
            EvaluationKind::StateExploration
        );
        assert!("4".parse::<EvaluationKind>().is_err());
    }

    #[test]
    fn identifiers_roundtrip_through_display() {
        for kind in EvaluationKind::ALL {
            let parsed: EvaluationKind = kind.to_string().parse().expect("roundtrip");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn cost_comparison_columns_are_fixed() {
        let headers = EvaluationKind::CostComparison(6).descriptor().headers();
        assert_eq!(headers.len(), 24);
        assert_eq!(&headers[..4], ["pos", "network", "optimal", "fraction"]);
        assert_eq!(headers[4], "random_05");
        assert_eq!(headers[23], "snowcap_95");
    }

    #[test]
    fn missing_policy_falls_back_to_default() {
        let descriptor = EvaluationKind::Complexity.descriptor();
        assert_eq!(descriptor.missing_policy("c42"), MissingPolicy::DropEntity);
        let cost = EvaluationKind::CostComparison(8).descriptor();
        assert_eq!(cost.missing_policy("snowcap"), MissingPolicy::Abort);
    }
}

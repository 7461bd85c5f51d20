use std::collections::BTreeMap;
use std::fmt::Debug;
use std::mem;

use indexmap::IndexMap;
use log::{debug, warn};
use recon_core::errors::{ErrorInfo, ReconError};
use recon_stat::{Outcome, OutcomeCounts, Sample};
use serde_json::Value;

use crate::entity::EntitySamples;
use crate::loader::RawRecord;
use crate::schema::{EvaluationKind, SampleSource, SchemaDescriptor, StrategySpec};

/// Turns raw records into per-entity samples.
///
/// `ingest` either commits everything a record contributes or nothing, so a
/// file rejected by the file policy never leaves partial state behind.
pub trait RecordExtractor: Debug + Send {
    /// Consumes one record.
    fn ingest(&mut self, record: &RawRecord) -> Result<(), ReconError>;

    /// Returns the collected entities in discovery order.
    ///
    /// Fails when an entity is incomplete across files.
    fn finish(&mut self) -> Result<Vec<EntitySamples>, ReconError>;
}

/// Extractor matching the evaluation described by `descriptor`.
pub fn extractor_for(descriptor: &SchemaDescriptor) -> Box<dyn RecordExtractor> {
    match descriptor.kind {
        EvaluationKind::ErrorRate => Box::new(ErrorRateExtractor::new(descriptor.headers())),
        EvaluationKind::Complexity => Box::new(ComplexityExtractor::default()),
        EvaluationKind::Classification => Box::new(ClassificationExtractor::default()),
        EvaluationKind::PacketLoss => Box::new(PacketLossExtractor::default()),
        EvaluationKind::CostBoxplot
        | EvaluationKind::SchedulingTime
        | EvaluationKind::CostComparison(_)
        | EvaluationKind::StateExploration => Box::new(StrategyExtractor::new(descriptor)),
    }
}

fn schema_error(code: &str, message: impl Into<String>, file: &str) -> ReconError {
    ReconError::Schema(ErrorInfo::new(code, message).with_context("file", file))
}

fn require<'a>(value: &'a Value, pointer: &str, file: &str) -> Result<&'a Value, ReconError> {
    value.pointer(pointer).ok_or_else(|| {
        schema_error("missing_key", format!("required key {pointer} is absent"), file)
            .with_context("key", pointer)
    })
}

fn require_number(value: &Value, pointer: &str, file: &str) -> Result<f64, ReconError> {
    require(value, pointer, file)?.as_f64().ok_or_else(|| {
        schema_error("not_a_number", format!("{pointer} is not a number"), file)
            .with_context("key", pointer)
    })
}

fn require_array<'a>(
    value: &'a Value,
    pointer: &str,
    file: &str,
) -> Result<&'a Vec<Value>, ReconError> {
    require(value, pointer, file)?.as_array().ok_or_else(|| {
        schema_error("not_an_array", format!("{pointer} is not an array"), file)
            .with_context("key", pointer)
    })
}

/// Reads a number or a `null` "no solution" marker.
fn measurement(value: &Value, what: &str, file: &str) -> Result<Option<f64>, ReconError> {
    match value {
        Value::Null => Ok(None),
        other => other.as_f64().map(Some).ok_or_else(|| {
            schema_error("not_a_number", format!("{what} is not a number"), file)
        }),
    }
}

fn read_sample(value: &Value, source: &SampleSource, file: &str) -> Result<Sample, ReconError> {
    let items = require_array(value, &source.pointer(), file)?;
    let values = match source {
        SampleSource::ValueArray { pointer } => items
            .iter()
            .map(|item| measurement(item, pointer, file))
            .collect::<Result<Vec<_>, _>>()?,
        SampleSource::RecordField { key, field } => items
            .iter()
            .map(|item| {
                let raw = item.get(field.as_str()).ok_or_else(|| {
                    schema_error(
                        "missing_field",
                        format!("an element of {key} has no {field}"),
                        file,
                    )
                })?;
                measurement(raw, field, file)
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(Sample::from_options(values))
}

/// Generic extractor driven by the strategy list of the descriptor.
#[derive(Debug)]
pub struct StrategyExtractor {
    strategies: Vec<StrategySpec>,
    ideal: Option<String>,
    entity_scalars: Vec<(String, String)>,
    entities: IndexMap<String, EntitySamples>,
}

impl StrategyExtractor {
    /// Extractor for the strategies, ideal and scalars of `descriptor`.
    pub fn new(descriptor: &SchemaDescriptor) -> Self {
        Self {
            strategies: descriptor.strategies.clone(),
            ideal: descriptor.ideal.clone(),
            entity_scalars: descriptor.entity_scalars.clone(),
            entities: IndexMap::new(),
        }
    }

    fn applies(spec: &StrategySpec, file_name: &str) -> bool {
        spec.file_suffix
            .as_deref()
            .map_or(true, |suffix| file_name.ends_with(suffix))
    }

    fn entity_id<'a>(&self, record: &'a RawRecord) -> &'a str {
        self.strategies
            .iter()
            .filter_map(|spec| spec.file_suffix.as_deref())
            .find_map(|suffix| record.file_name.strip_suffix(suffix))
            .unwrap_or_else(|| record.stem())
    }
}

impl RecordExtractor for StrategyExtractor {
    fn ingest(&mut self, record: &RawRecord) -> Result<(), ReconError> {
        let value = record.json()?;
        let file = record.file_name.as_str();

        let mut samples = Vec::new();
        for spec in self
            .strategies
            .iter()
            .filter(|spec| Self::applies(spec, file))
        {
            samples.push((spec.label.clone(), read_sample(value, &spec.source, file)?));
        }
        if samples.is_empty() {
            debug!("{file}: no strategy reads this file");
            return Ok(());
        }
        let ideal = match &self.ideal {
            Some(pointer) => measurement(require(value, pointer, file)?, pointer, file)?,
            None => None,
        };
        let mut scalars = BTreeMap::new();
        for (name, pointer) in &self.entity_scalars {
            scalars.insert(name.clone(), require_number(value, pointer, file)?);
        }

        let id = self.entity_id(record).to_string();
        let discovery = self.entities.len();
        let entity = self
            .entities
            .entry(id.clone())
            .or_insert_with(|| EntitySamples::new(id, discovery));
        for (label, sample) in samples {
            if entity.samples.insert(label.clone(), sample).is_some() {
                warn!("{}: {label} appears in more than one file", entity.id);
            }
        }
        if ideal.is_some() {
            entity.ideal = ideal;
        }
        entity.scalars.extend(scalars);
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<EntitySamples>, ReconError> {
        let entities: Vec<EntitySamples> = mem::take(&mut self.entities).into_values().collect();
        for entity in &entities {
            for spec in &self.strategies {
                let Some(suffix) = spec.file_suffix.as_deref() else {
                    continue;
                };
                if !entity.samples.contains_key(&spec.label) {
                    let file = format!("{}{suffix}", entity.id);
                    return Err(schema_error(
                        "missing_strategy_file",
                        format!("no {} result for {}", spec.label, entity.id),
                        &file,
                    )
                    .with_context("entity", entity.id.clone()));
                }
            }
        }
        Ok(entities)
    }
}

/// Error rates of the random orderings; one entity per network in every file.
#[derive(Debug, Default)]
pub struct ErrorRateExtractor {
    orderings: Vec<String>,
    entities: Vec<EntitySamples>,
}

impl ErrorRateExtractor {
    /// Extractor reporting the error rate of each named ordering.
    pub fn new(orderings: Vec<String>) -> Self {
        Self {
            orderings,
            entities: Vec::new(),
        }
    }
}

impl RecordExtractor for ErrorRateExtractor {
    fn ingest(&mut self, record: &RawRecord) -> Result<(), ReconError> {
        let file = record.file_name.as_str();
        let networks = record.json()?.as_array().ok_or_else(|| {
            schema_error("not_an_array", "expected an array of networks", file)
        })?;
        let mut parsed = Vec::with_capacity(networks.len());
        for (idx, network) in networks.iter().enumerate() {
            let mut entity =
                EntitySamples::new(format!("{}#{idx}", record.stem()), self.entities.len() + idx);
            for ordering in &self.orderings {
                let success_rate =
                    require_number(network, &format!("/{ordering}/result/success_rate"), file)
                        .map_err(|err| err.with_context("network", idx.to_string()))?;
                entity.scalars.insert(ordering.clone(), 1.0 - success_rate);
            }
            parsed.push(entity);
        }
        self.entities.extend(parsed);
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<EntitySamples>, ReconError> {
        Ok(mem::take(&mut self.entities))
    }
}

/// Mean scheduling time per complexity level, one strategy per command count.
#[derive(Debug, Default)]
pub struct ComplexityExtractor {
    // complexity -> repetition -> (label, sample)
    levels: BTreeMap<u64, BTreeMap<u64, (String, Sample)>>,
}

fn parse_complexity_name(file: &str) -> Option<(u64, u64)> {
    let stem = file.strip_suffix(".json")?;
    let (r, v) = stem.split_once('_')?;
    let r = r.strip_prefix('r')?.parse().ok()?;
    let v = v.strip_prefix('v')?.parse().ok()?;
    Some((r, v))
}

impl RecordExtractor for ComplexityExtractor {
    fn ingest(&mut self, record: &RawRecord) -> Result<(), ReconError> {
        let file = record.file_name.as_str();
        let (repetition, level) = parse_complexity_name(file).ok_or_else(|| {
            schema_error(
                "unexpected_file_name",
                "expected a file named r<r>_v<v>.json",
                file,
            )
        })?;
        let value = record.json()?;
        let num_commands = require(value, "/num_commands", file)?
            .as_u64()
            .ok_or_else(|| schema_error("not_a_count", "num_commands is not a count", file))?;
        let sample = read_sample(
            value,
            &SampleSource::RecordField {
                key: "strategy_result".to_string(),
                field: "time".to_string(),
            },
            file,
        )?;
        self.levels
            .entry(level)
            .or_default()
            .insert(repetition, (format!("c{num_commands}"), sample));
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<EntitySamples>, ReconError> {
        Ok(mem::take(&mut self.levels)
            .into_iter()
            .enumerate()
            .map(|(discovery, (level, repetitions))| {
                let mut entity = EntitySamples::new(level.to_string(), discovery);
                entity.scalars.insert("complexity".to_string(), level as f64);
                for (_, (label, sample)) in repetitions {
                    if entity.samples.insert(label.clone(), sample).is_some() {
                        warn!("complexity {level}: {label} measured twice, keeping the last");
                    }
                }
                entity
            })
            .collect())
    }
}

/// Confusion counts printed after the `Results:` marker of the classifier log.
#[derive(Debug, Default)]
pub struct ClassificationExtractor {
    entities: Vec<EntitySamples>,
}

const RESULTS_MARKER: &str = "Results:";
const CLASSIFICATION_LINES: usize = 4;

fn parse_classification_line(line: &str, file: &str) -> Result<(String, u64, f64), ReconError> {
    let malformed = || {
        schema_error(
            "malformed_result_line",
            "expected `Label: count (pct%)`",
            file,
        )
        .with_context("line", line.trim())
    };
    let (label, rest) = line.split_once(':').ok_or_else(malformed)?;
    let mut parts = rest.split_whitespace();
    let count = parts
        .next()
        .and_then(|count| count.parse::<u64>().ok())
        .ok_or_else(malformed)?;
    let percent = parts
        .next()
        .map(|pct| pct.trim_matches(|c: char| c == '(' || c == ')' || c == '%'))
        .and_then(|pct| pct.parse::<f64>().ok())
        .ok_or_else(malformed)?;
    Ok((label.trim().to_string(), count, percent / 100.0))
}

impl RecordExtractor for ClassificationExtractor {
    fn ingest(&mut self, record: &RawRecord) -> Result<(), ReconError> {
        let file = record.file_name.as_str();
        let mut lines = record
            .text()?
            .lines()
            .skip_while(|line| line.trim() != RESULTS_MARKER)
            .skip(1);
        let mut parsed = Vec::with_capacity(CLASSIFICATION_LINES);
        for _ in 0..CLASSIFICATION_LINES {
            let line = lines.next().ok_or_else(|| {
                schema_error(
                    "missing_results_section",
                    format!("expected {CLASSIFICATION_LINES} lines after {RESULTS_MARKER}"),
                    file,
                )
            })?;
            let (label, count, rate) = parse_classification_line(line, file)?;
            let mut entity = EntitySamples::new(label, self.entities.len() + parsed.len());
            entity.scalars.insert("count".to_string(), count as f64);
            entity.scalars.insert("rate".to_string(), rate);
            parsed.push(entity);
        }
        self.entities.extend(parsed);
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<EntitySamples>, ReconError> {
        Ok(mem::take(&mut self.entities))
    }
}

/// Transmitted and dropped packets of a replayed reconfiguration.
#[derive(Debug, Default)]
pub struct PacketLossExtractor {
    entities: Vec<EntitySamples>,
}

/// Time resolution of the packet replay, in packets per flow and second.
const PACKETS_PER_SECOND: f64 = 100.0;

/// A packet is delivered when its path is truthy: no `null`, `false`, `0`,
/// empty string, array or object.
fn delivered(path: &Value) -> bool {
    match path {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(false, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(hops) => !hops.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

impl RecordExtractor for PacketLossExtractor {
    fn ingest(&mut self, record: &RawRecord) -> Result<(), ReconError> {
        let file = record.file_name.as_str();
        let flows = record
            .json()?
            .as_array()
            .ok_or_else(|| schema_error("not_an_array", "expected an array of flows", file))?;
        if flows.is_empty() {
            return Err(schema_error("no_flows", "the replay contains no flow", file));
        }
        let mut outcomes = Vec::new();
        for flow in flows {
            for step in require_array(flow, "/paths", file)? {
                let paths = step
                    .as_array()
                    .ok_or_else(|| schema_error("not_an_array", "a step is not an array", file))?;
                for path in paths {
                    let count = require(path, "/count", file)?.as_u64().ok_or_else(|| {
                        schema_error("not_a_count", "count is not a packet count", file)
                    })?;
                    let hops = require(path, "/path", file)?;
                    outcomes.push(if delivered(hops) {
                        Outcome::Success(count)
                    } else {
                        Outcome::Failure(count)
                    });
                }
            }
        }
        let counts = OutcomeCounts::tally(outcomes);

        let mut entity = EntitySamples::new(record.stem(), self.entities.len());
        entity
            .scalars
            .insert("transmitted".to_string(), counts.success as f64);
        entity
            .scalars
            .insert("dropped".to_string(), counts.failure as f64);
        if let (Some(success), Some(error)) = (counts.success_rate(), counts.error_rate()) {
            entity
                .scalars
                .insert("transmitted_rate".to_string(), success);
            entity.scalars.insert("dropped_rate".to_string(), error);
        }
        entity.scalars.insert(
            "time".to_string(),
            counts.total() as f64 / flows.len() as f64 / PACKETS_PER_SECOND,
        );
        self.entities.push(entity);
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<EntitySamples>, ReconError> {
        Ok(mem::take(&mut self.entities))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::loader::RecordContent;

    fn json_record(file_name: &str, value: Value) -> RawRecord {
        RawRecord {
            path: PathBuf::from(file_name),
            file_name: file_name.to_string(),
            content: RecordContent::Json(value),
        }
    }

    #[test]
    fn strategy_samples_keep_missing_markers() {
        let descriptor = EvaluationKind::CostComparison(6).descriptor();
        let mut extractor = StrategyExtractor::new(&descriptor);
        let record = json_record(
            "Abilene.json",
            json!({
                "ideal_cost": 2.0,
                "random_result": [{"cost": 4.0}, {"cost": null}],
                "strategy_result": [{"cost": 2.0}],
                "baseline_mif_result": [{"cost": 3.0}],
                "baseline_mil_result": [{"cost": 3.5}]
            }),
        );
        extractor.ingest(&record).expect("ingest");
        let entities = extractor.finish().expect("finish");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, "Abilene");
        assert_eq!(entities[0].ideal, Some(2.0));
        assert!(entities[0].samples["random"].has_missing());
        assert_eq!(entities[0].samples["snowcap"].values(), &[2.0]);
    }

    #[test]
    fn failing_record_leaves_no_partial_entity() {
        let descriptor = EvaluationKind::CostComparison(6).descriptor();
        let mut extractor = StrategyExtractor::new(&descriptor);
        let record = json_record(
            "Abilene.json",
            json!({
                "ideal_cost": 2.0,
                "random_result": [{"cost": 4.0}],
                "strategy_result": [{"time": 2.0}],
                "baseline_mif_result": [],
                "baseline_mil_result": []
            }),
        );
        let err = extractor.ingest(&record).expect_err("missing field");
        assert!(matches!(err, ReconError::Schema(_)));
        assert!(extractor.finish().expect("finish").is_empty());
    }

    #[test]
    fn suffixed_files_join_on_network() {
        let descriptor = EvaluationKind::StateExploration.descriptor();
        let mut extractor = StrategyExtractor::new(&descriptor);
        extractor
            .ingest(&json_record(
                "Abilene.gml.optim.json",
                json!({"strategy_result": [{"num_states": 7}]}),
            ))
            .expect("optim");
        extractor
            .ingest(&json_record(
                "Abilene.gml.rand.json",
                json!({"random_result": [{"num_states": 40}]}),
            ))
            .expect("rand");
        extractor
            .ingest(&json_record(
                "Abilene.gml.strat.json",
                json!({"strategy_result": [{"num_states": 3}]}),
            ))
            .expect("strat");
        let entities = extractor.finish().expect("finish");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].samples["optimizer"].values(), &[7.0]);
        assert_eq!(entities[0].samples["random"].values(), &[40.0]);
        assert_eq!(entities[0].samples["strategy"].values(), &[3.0]);
    }

    #[test]
    fn network_without_optimizer_file_is_rejected() {
        let descriptor = EvaluationKind::StateExploration.descriptor();
        let mut extractor = StrategyExtractor::new(&descriptor);
        extractor
            .ingest(&json_record(
                "A.gml.rand.json",
                json!({"random_result": [{"num_states": 4}]}),
            ))
            .expect("rand");
        extractor
            .ingest(&json_record(
                "A.gml.strat.json",
                json!({"strategy_result": [{"num_states": 2}]}),
            ))
            .expect("strat");
        let err = extractor.finish().expect_err("incomplete network");
        assert!(matches!(err, ReconError::Schema(_)));
        assert_eq!(err.info().code, "missing_strategy_file");
        assert_eq!(
            err.info().context.get("file").map(String::as_str),
            Some("A.gml.optim.json")
        );
    }

    #[test]
    fn falsy_paths_count_as_dropped() {
        for path in [json!(null), json!(false), json!(0), json!(""), json!([]), json!({})] {
            assert!(!delivered(&path), "{path} should be dropped");
        }
        for path in [json!([1, 2]), json!(3), json!("r1"), json!(true)] {
            assert!(delivered(&path), "{path} should be delivered");
        }
    }

    #[test]
    fn error_rate_is_complement_of_success() {
        let descriptor = EvaluationKind::ErrorRate.descriptor();
        let mut extractor = extractor_for(&descriptor);
        let network = |rate: f64| json!({"result": {"success_rate": rate}});
        extractor
            .ingest(&json_record(
                "batch.json",
                json!([{
                    "random_permutations": network(0.25),
                    "random_router_order": network(1.0),
                    "insert_before_order": network(0.5)
                }]),
            ))
            .expect("ingest");
        let entities = extractor.finish().expect("finish");
        assert_eq!(entities[0].id, "batch#0");
        assert_eq!(entities[0].scalars["random_permutations"], 0.75);
        assert_eq!(entities[0].scalars["random_router_order"], 0.0);
    }

    #[test]
    fn complexity_groups_by_level() {
        let mut extractor = ComplexityExtractor::default();
        for (file, commands, time) in [
            ("r3_v1.json", 9, 4.0),
            ("r1_v1.json", 5, 2.0),
            ("r1_v0.json", 5, 1.0),
        ] {
            extractor
                .ingest(&json_record(
                    file,
                    json!({"num_commands": commands, "strategy_result": [{"time": time}]}),
                ))
                .expect("ingest");
        }
        let entities = extractor.finish().expect("finish");
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].scalars["complexity"], 1.0);
        let labels: Vec<&str> = entities[1].samples.keys().map(String::as_str).collect();
        assert_eq!(labels, ["c5", "c9"]);
    }

    #[test]
    fn parses_classifier_results() {
        let mut extractor = ClassificationExtractor::default();
        let record = RawRecord {
            path: PathBuf::from("raw_output"),
            file_name: "raw_output".to_string(),
            content: RecordContent::Text(
                "training...\nResults:\nTrue Positive: 80 (40.0%)\nTrue Negative: 100 (50.0%)\n\
                 False Positive: 15 (7.5%)\nFalse Negative: 5 (2.5%)\n"
                    .to_string(),
            ),
        };
        extractor.ingest(&record).expect("ingest");
        let entities = extractor.finish().expect("finish");
        assert_eq!(entities.len(), 4);
        assert_eq!(entities[2].id, "False Positive");
        assert_eq!(entities[2].scalars["count"], 15.0);
        assert_eq!(entities[2].scalars["rate"], 0.075);
    }

    #[test]
    fn classifier_log_without_marker_is_schema_error() {
        let mut extractor = ClassificationExtractor::default();
        let record = RawRecord {
            path: PathBuf::from("raw_output"),
            file_name: "raw_output".to_string(),
            content: RecordContent::Text("nothing here\n".to_string()),
        };
        assert!(matches!(
            extractor.ingest(&record),
            Err(ReconError::Schema(_))
        ));
    }

    #[test]
    fn packet_counts_follow_delivered_paths() {
        let mut extractor = PacketLossExtractor::default();
        let record = json_record(
            "random.json",
            json!([
                {"paths": [[{"path": [1, 2], "count": 60}, {"path": null, "count": 20}]]},
                {"paths": [[{"path": [3], "count": 20}]]}
            ]),
        );
        extractor.ingest(&record).expect("ingest");
        let entities = extractor.finish().expect("finish");
        let scalars = &entities[0].scalars;
        assert_eq!(entities[0].id, "random");
        assert_eq!(scalars["transmitted"], 80.0);
        assert_eq!(scalars["dropped"], 20.0);
        assert_eq!(scalars["dropped_rate"], 1.0 - 0.8);
        assert_eq!(scalars["time"], 0.5);
    }
}

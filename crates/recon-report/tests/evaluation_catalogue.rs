use std::fs;
use std::path::{Path, PathBuf};

use recon_core::errors::ReconError;
use recon_report::{collect, run, EvalContext, EvaluationKind, ReconConfig, ResultSource};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            root: tempdir().expect("root"),
        }
    }

    fn dir(&self, kind: EvaluationKind) -> PathBuf {
        let dir = self.root.path().join(kind.result_dir_name());
        fs::create_dir_all(&dir).expect("result dir");
        dir
    }

    fn json(&self, kind: EvaluationKind, name: &str, value: Value) {
        let path = self.dir(kind).join(name);
        fs::write(path, serde_json::to_vec(&value).expect("json")).expect("write");
    }

    fn raw(&self, kind: EvaluationKind, name: &str, content: &str) {
        fs::write(self.dir(kind).join(name), content).expect("write");
    }

    fn context(&self) -> EvalContext {
        let config = ReconConfig {
            root: self.root.path().to_path_buf(),
            ..ReconConfig::default()
        };
        EvalContext::new(&config, ResultSource::Fresh).expect("context")
    }

    fn table(&self, out_dir: &Path, name: &str) -> String {
        fs::read_to_string(out_dir.join(name)).expect("table")
    }
}

fn times(values: &[f64]) -> Value {
    Value::Array(values.iter().map(|time| json!({ "time": time })).collect())
}

fn states(values: &[f64]) -> Value {
    Value::Array(values.iter().map(|n| json!({ "num_states": n })).collect())
}

#[test]
fn error_rates_skip_unreadable_files() {
    let fx = Fixture::new();
    let kind = EvaluationKind::ErrorRate;
    let ordering = |rate: f64| json!({ "result": { "success_rate": rate } });
    fx.json(
        kind,
        "batch.json",
        json!([
            {
                "random_permutations": ordering(0.25),
                "random_router_order": ordering(0.5),
                "insert_before_order": ordering(1.0)
            },
            {
                "random_permutations": ordering(0.75),
                "random_router_order": ordering(0.5),
                "insert_before_order": ordering(1.0)
            }
        ]),
    );
    fx.raw(kind, "garbage", "not json at all");

    let report = run(&fx.context(), kind).expect("run");
    assert_eq!(report.skipped_files, ["garbage"]);
    assert_eq!(
        fx.table(&report.out_dir, "data.csv"),
        "random_permutations,random_router_order,insert_before_order\n0.75,0.5,0\n0.25,0.5,0\n"
    );
    assert_eq!(report.summary.scalars["random_permutations_median"], 0.5);
}

#[test]
fn boxplot_lists_fliers_per_topology() {
    let fx = Fixture::new();
    let kind = EvaluationKind::CostBoxplot;
    let topology = |values: &[f64]| {
        json!([{ "random_permutations": { "cost": { "values": values } }, "ideal_cost": 1 }])
    };
    fx.json(kind, "Abilene.gml.json", topology(&[1.0, 2.0, 3.0, 4.0, 100.0]));
    fx.json(kind, "Zib54.gml.json", topology(&[5.0, 5.0, 5.0]));

    let report = run(&fx.context(), kind).expect("run");
    assert_eq!(
        fx.table(&report.out_dir, "data.csv"),
        "topology,name,y_pos,ideal,lower_whisker,lower_quartile,median,upper_quartile,upper_whisker\n\
         Zib54,Zib,0,1,5,5,5,5,5\n\
         Abilene,Abilene,1.5,1,1,2,3,4,4\n"
    );
    assert_eq!(fx.table(&report.out_dir, "Abilene_fliers.csv"), "100\n");
    assert_eq!(fx.table(&report.out_dir, "Zib54_fliers.csv"), "");
}

#[test]
fn boxplot_aborts_on_missing_cost() {
    let fx = Fixture::new();
    let kind = EvaluationKind::CostBoxplot;
    fx.json(
        kind,
        "Abilene.gml.json",
        json!([{ "random_permutations": { "cost": { "values": [1.0, null, 3.0] } }, "ideal_cost": 1 }]),
    );
    fx.json(
        kind,
        "Zib54.gml.json",
        json!([{ "random_permutations": { "cost": { "values": [5.0] } }, "ideal_cost": 1 }]),
    );

    let err = run(&fx.context(), kind).expect_err("abort");
    assert!(matches!(err, ReconError::UndefinedResult(_)));
    assert_eq!(
        err.info().context.get("entity").map(String::as_str),
        Some("Abilene")
    );
    assert!(!fx.dir(kind).join("plot").exists());
}

#[test]
fn scheduling_time_keeps_rows_without_random_result() {
    let fx = Fixture::new();
    let kind = EvaluationKind::SchedulingTime;
    fx.json(
        kind,
        "c9.json",
        json!({
            "num_commands": 9,
            "random_result": times(&[3.0]),
            "tree_result": times(&[6.0]),
            "strategy_result": times(&[2.0])
        }),
    );
    fx.json(
        kind,
        "c5.json",
        json!({
            "num_commands": 5,
            "random_result": [],
            "tree_result": times(&[2.0, 4.0]),
            "strategy_result": times(&[1.0])
        }),
    );
    fx.json(kind, "partial.json", json!({ "num_commands": 7 }));

    let report = run(&fx.context(), kind).expect("run");
    assert_eq!(report.skipped_files, ["partial.json"]);
    assert_eq!(
        fx.table(&report.out_dir, "data.csv"),
        "x,random,tree,snowcap\n5,,3,1\n9,3,6,2\n"
    );
}

#[test]
fn complexity_columns_follow_command_counts() {
    let fx = Fixture::new();
    let kind = EvaluationKind::Complexity;
    for (file, commands, samples) in [
        ("r1_v0.json", 5, vec![1.0, 3.0]),
        ("r3_v0.json", 9, vec![4.0]),
        ("r1_v1.json", 5, vec![2.0]),
        ("r3_v1.json", 9, vec![8.0]),
    ] {
        fx.json(
            kind,
            file,
            json!({ "num_commands": commands, "strategy_result": times(&samples) }),
        );
    }

    let report = run(&fx.context(), kind).expect("run");
    assert_eq!(
        fx.table(&report.out_dir, "data.csv"),
        "complexity,c5,c9\n0,2,4\n1,2,8\n"
    );
}

#[test]
fn state_exploration_joins_strategy_files() {
    let fx = Fixture::new();
    let kind = EvaluationKind::StateExploration;
    fx.json(
        kind,
        "Abilene.gml.rand.json",
        json!({ "random_result": states(&[10.0, 20.0]) }),
    );
    fx.json(
        kind,
        "Abilene.gml.optim.json",
        json!({ "strategy_result": states(&[4.0]) }),
    );
    fx.json(
        kind,
        "Abilene.gml.strat.json",
        json!({ "strategy_result": states(&[2.0]) }),
    );
    fx.json(
        kind,
        "Brain.gml.rand.json",
        json!({ "random_result": states(&[7.0]) }),
    );
    fx.json(
        kind,
        "Brain.gml.optim.json",
        json!({ "strategy_result": states(&[3.0]) }),
    );
    fx.json(
        kind,
        "Brain.gml.strat.json",
        json!({ "strategy_result": states(&[1.0]) }),
    );

    let collected = collect(&fx.context(), kind).expect("collect");
    let dataset = collected.dataset;
    assert_eq!(dataset.columns.len(), 17);
    assert_eq!(&dataset.columns[..2], ["idx", "network"]);
    let order: Vec<&str> = dataset.rows.iter().map(|row| row.id.as_str()).collect();
    assert_eq!(order, ["Brain", "Abilene"]);
    let random_50 = dataset.column_index("random_50").expect("column");
    assert_eq!(dataset.rows[1].cells[random_50].as_f64(), Some(15.0));
    assert_eq!(dataset.rows[1].cells[0].as_f64(), Some(1.0));
}

#[test]
fn classification_table_reads_results_section() {
    let fx = Fixture::new();
    let kind = EvaluationKind::Classification;
    fx.raw(
        kind,
        "raw_output",
        "epoch 1\nepoch 2\nResults:\nTrue Positive: 80 (40.0%)\nTrue Negative: 100 (50.0%)\n\
         False Positive: 15 (7.5%)\nFalse Negative: 5 (2.5%)\n",
    );

    let report = run(&fx.context(), kind).expect("run");
    assert!(report.out_dir.ends_with("table"));
    let table = fx.table(&report.out_dir, "table.csv");
    let mut lines = table.lines();
    assert_eq!(lines.next(), Some("outcome,count,rate"));
    assert_eq!(lines.next(), Some("True Positive,80,0.4"));
    assert_eq!(report.summary.scalars["total"], 200.0);
}

#[test]
fn packet_loss_counts_each_replay() {
    let fx = Fixture::new();
    let kind = EvaluationKind::PacketLoss;
    fx.json(
        kind,
        "random.json",
        json!([
            { "paths": [[{ "path": [1, 2], "count": 60 }, { "path": null, "count": 40 }]] }
        ]),
    );
    fx.json(
        kind,
        "snowcap.json",
        json!([
            { "paths": [[{ "path": [1, 2], "count": 100 }]] },
            { "paths": [[{ "path": [3], "count": 100 }]] }
        ]),
    );

    let report = run(&fx.context(), kind).expect("run");
    let table = fx.table(&report.out_dir, "table.csv");
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(
        lines[0],
        "strategy,transmitted,dropped,transmitted_rate,dropped_rate,time"
    );
    assert_eq!(lines[1], "random,60,40,0.6,0.4,1");
    assert_eq!(lines[2], "snowcap,200,0,1,0,1");
}

#[test]
fn state_exploration_requires_every_strategy_file() {
    let fx = Fixture::new();
    let kind = EvaluationKind::StateExploration;
    fx.json(kind, "A.gml.rand.json", json!({ "random_result": states(&[4.0]) }));
    fx.json(kind, "A.gml.strat.json", json!({ "strategy_result": states(&[2.0]) }));

    let err = run(&fx.context(), kind).expect_err("incomplete network");
    assert!(matches!(err, ReconError::Schema(_)));
    assert_eq!(
        err.info().context.get("file").map(String::as_str),
        Some("A.gml.optim.json")
    );
    assert!(!fx.dir(kind).join("plot").exists());
}

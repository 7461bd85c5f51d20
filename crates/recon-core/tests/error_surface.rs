use recon_core::errors::{ErrorInfo, ReconError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("file", "Abilene.json")
        .with_context("strategy", "snowcap")
}

#[test]
fn parse_error_surface() {
    let err = ReconError::Parse(sample_info("P001", "expected value"));
    assert_eq!(err.info().code, "P001");
    assert!(err.info().context.contains_key("file"));
    assert!(err.is_file_level());
}

#[test]
fn schema_error_surface() {
    let err = ReconError::Schema(sample_info("S001", "missing key"));
    assert_eq!(err.info().code, "S001");
    assert!(err.is_file_level());
}

#[test]
fn undefined_result_is_not_file_level() {
    let err = ReconError::UndefinedResult(sample_info("U001", "no solution"));
    assert_eq!(err.info().code, "U001");
    assert!(!err.is_file_level());
}

#[test]
fn degenerate_sample_surface() {
    let err = ReconError::DegenerateSample(sample_info("D001", "empty sample"));
    assert_eq!(err.info().code, "D001");
    assert!(!err.is_file_level());
}

#[test]
fn context_is_appended_without_changing_family() {
    let err = ReconError::Schema(ErrorInfo::new("S002", "missing key"))
        .with_context("entity", "Chinanet");
    assert!(matches!(err, ReconError::Schema(_)));
    assert_eq!(
        err.info().context.get("entity").map(String::as_str),
        Some("Chinanet")
    );
}

#[test]
fn display_lists_context_and_hint() {
    let err = ReconError::Io(
        ErrorInfo::new("io.read", "failed to read")
            .with_context("path", "/tmp/x.json")
            .with_hint("check permissions"),
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("io error: failed to read (code: io.read)"));
    assert!(rendered.contains("path=/tmp/x.json"));
    assert!(rendered.contains("hint: check permissions"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = ReconError::Export(ErrorInfo::new("export.csv", "write failed"));
    let value = serde_json::to_value(&err).expect("serialize");
    assert_eq!(value["family"], "Export");
    assert_eq!(value["detail"]["code"], "export.csv");
}

use prometheus_exporter::errors::{ExporterError, Result};
use std::error::Error;

#[cfg(test)]
mod error_creation_tests {
    use super::*;

    #[test]
    fn test_duplicate_metric_error() {
        let error = ExporterError::duplicate_metric("metric 'hits{}' is already registered");

        assert!(matches!(error, ExporterError::DuplicateMetric(_)));
        assert!(error.to_string().contains("Duplicate Metric"));
        assert!(error.to_string().contains("hits{}"));
    }

    #[test]
    fn test_invalid_configuration_error() {
        let error = ExporterError::invalid_configuration("enum requires states");

        assert!(matches!(error, ExporterError::InvalidConfiguration(_)));
        assert!(error.to_string().contains("Invalid Configuration"));
        assert!(error.to_string().contains("enum requires states"));
    }

    #[test]
    fn test_invalid_state_error() {
        let error = ExporterError::invalid_state("'paused' is not declared");

        assert!(matches!(error, ExporterError::InvalidState(_)));
        assert!(error.to_string().contains("'paused' is not declared"));
    }

    #[test]
    fn test_coercion_and_collector_errors() {
        let coercion = ExporterError::value_coercion("cannot convert \"abc\"");
        let collector = ExporterError::collector_failed("timeout");

        assert!(matches!(coercion, ExporterError::ValueCoercion(_)));
        assert!(matches!(collector, ExporterError::CollectorFailed(_)));
        assert_eq!(collector.message(), "timeout");
    }

    #[test]
    fn test_string_conversions() {
        let from_str = ExporterError::registry("bad label");
        let from_string = ExporterError::registry(String::from("bad label"));
        assert_eq!(from_str.message(), from_string.message());
    }
}

#[cfg(test)]
mod error_code_tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let cases = [
            (ExporterError::duplicate_metric(""), "E001"),
            (ExporterError::invalid_configuration(""), "E002"),
            (ExporterError::invalid_state(""), "E003"),
            (ExporterError::value_coercion(""), "E004"),
            (ExporterError::collector_failed(""), "E005"),
            (ExporterError::registry(""), "E006"),
            (ExporterError::encoding(""), "E007"),
        ];
        for (error, code) in cases {
            assert_eq!(error.code(), code, "{:?}", error);
        }
    }

    #[test]
    fn test_error_types_are_distinct() {
        let types: std::collections::HashSet<&str> = [
            ExporterError::duplicate_metric(""),
            ExporterError::invalid_configuration(""),
            ExporterError::invalid_state(""),
            ExporterError::value_coercion(""),
            ExporterError::collector_failed(""),
            ExporterError::registry(""),
            ExporterError::encoding(""),
        ]
        .iter()
        .map(|e| e.error_type())
        .collect();
        assert_eq!(types.len(), 7);
    }
}

#[cfg(test)]
mod error_format_tests {
    use super::*;

    #[test]
    fn test_format_simple() {
        let error = ExporterError::encoding("invalid utf-8");
        assert_eq!(error.format_simple(), "Encoding Error: invalid utf-8");
        assert_eq!(error.to_string(), error.format_simple());
    }

    #[cfg(feature = "server")]
    #[test]
    fn test_format_colored_contains_parts() {
        colored::control::set_override(false);
        let error = ExporterError::invalid_state("unknown state");
        let output = error.format_colored();
        assert!(output.contains("E003"));
        assert!(output.contains("Invalid State"));
        assert!(output.contains("unknown state"));
    }

    #[test]
    fn test_is_std_error() {
        let error = ExporterError::registry("x");
        let dyn_error: &dyn Error = &error;
        assert!(dyn_error.source().is_none());
    }
}

#[cfg(test)]
mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_from_prometheus_already_registered() {
        let error: ExporterError = prometheus::Error::AlreadyReg.into();
        assert!(matches!(error, ExporterError::DuplicateMetric(_)));
    }

    #[test]
    fn test_from_prometheus_other() {
        let error: ExporterError = prometheus::Error::Msg("descriptor mismatch".to_string()).into();
        assert!(matches!(error, ExporterError::Registry(_)));
        assert!(error.message().contains("descriptor mismatch"));
    }

    #[test]
    fn test_from_utf8_error() {
        let bad = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let error: ExporterError = bad.into();
        assert!(matches!(error, ExporterError::Encoding(_)));
    }

    #[test]
    fn test_question_mark_propagation() {
        fn register() -> Result<()> {
            let stored: std::result::Result<(), prometheus::Error> =
                Err(prometheus::Error::AlreadyReg);
            stored?;
            Ok(())
        }
        assert!(matches!(register(), Err(ExporterError::DuplicateMetric(_))));
    }
}

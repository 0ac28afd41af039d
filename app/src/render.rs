use dualfit::evaluate::AverageMetrics;
use dualfit::{CrossValSummary, EstimatorKind, ExperimentReport};
use std::fmt::Write;

/// Plain-text rendering of a finished experiment.
pub fn render_report(report: &ExperimentReport) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, report)?;
    Ok(out)
}

fn write_report(out: &mut String, report: &ExperimentReport) -> std::fmt::Result {
    let dataset = &report.dataset;
    writeln!(out, "Dataset: {} rows", dataset.rows)?;
    writeln!(out, "\nMissing values per column:")?;
    for column in &dataset.columns {
        writeln!(out, "  {:<16} {}", column.name, column.nulls)?;
    }
    writeln!(out, "\nClass encoding:")?;
    for (code, (label, count)) in dataset.class_counts.iter().enumerate() {
        writeln!(out, "  {} -> {:<20} {} rows", code, label, count)?;
    }
    writeln!(out, "\nFirst rows after encoding:")?;
    for row in &dataset.preview {
        let values: Vec<String> = row.features.iter().map(|v| format!("{:.1}", v)).collect();
        writeln!(out, "  [{}] -> {}", values.join(", "), row.code)?;
    }

    let split = &report.split;
    writeln!(
        out,
        "\nSplit: {} train / {} test (test ratio {}, seed {})",
        split.train_rows, split.test_rows, split.test_ratio, split.seed
    )?;

    let classification = &report.classification;
    writeln!(out, "\nEvaluation of {}:", report.classifier_name)?;
    writeln!(out, "Accuracy: {:.4}", classification.accuracy)?;
    writeln!(out, "\n{:>20} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
    for class in &classification.per_class {
        writeln!(
            out,
            "{:>20} {:>10.2} {:>10.2} {:>10.2} {:>10}",
            class.label, class.precision, class.recall, class.f1, class.support
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "{:>20} {:>10} {:>10} {:>10.2} {:>10}",
        "accuracy", "", "", classification.accuracy, classification.n_samples
    )?;
    write_average(out, "macro avg", &classification.macro_avg)?;
    write_average(out, "weighted avg", &classification.weighted_avg)?;

    writeln!(out, "\nEvaluation of {}:", report.regressor_name)?;
    writeln!(out, "R²: {:.4}", report.regression.r2)?;

    writeln!(out, "\nComparison:")?;
    writeln!(out, "  The SVM solves a classification problem, so accuracy is its natural metric.")?;
    writeln!(out, "  Linear regression was trained on the same label codes but is suited to regression problems.")?;
    writeln!(out, "  A very high SVM accuracy can hint at overfitting; cross-validation below helps to check it.")?;
    writeln!(out, "  A low R² means the regressor does not fit a classification target well.")?;

    for summary in &report.cross_validation {
        write_cross_validation(out, report, summary)?;
    }
    Ok(())
}

fn write_average(out: &mut String, name: &str, avg: &AverageMetrics) -> std::fmt::Result {
    writeln!(
        out,
        "{:>20} {:>10.2} {:>10.2} {:>10.2} {:>10}",
        name, avg.precision, avg.recall, avg.f1, avg.support
    )
}

fn write_cross_validation(out: &mut String, report: &ExperimentReport, summary: &CrossValSummary) -> std::fmt::Result {
    let (name, metric) = match summary.estimator {
        EstimatorKind::Classifier => (report.classifier_name, "accuracy"),
        EstimatorKind::Regressor => (report.regressor_name, "R²"),
    };
    let scores: Vec<String> = summary.scores.iter().map(|s| format!("{:.4}", s)).collect();
    writeln!(out, "\nCross-validation scores ({}): [{}]", name, scores.join(", "))?;
    writeln!(out, "Mean {} ({}): {:.4} (std {:.4})", metric, name, summary.mean, summary.std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualfit::{ExperimentConfig, ExperimentRunner};

    #[test]
    fn test_regressor_cv_is_labelled_r2() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/iris.data");
        let report = ExperimentRunner::new(ExperimentConfig::new(path)).run().unwrap();
        let text = render_report(&report).unwrap();

        assert!(text.contains("Dataset: 150 rows"));
        assert!(text.contains("Mean accuracy (SVM (linear kernel))"));
        assert!(text.contains("Mean R² (Linear Regression)"));
        assert!(!text.contains("Mean accuracy (Linear Regression)"));
        assert!(text.contains("weighted avg"));
    }
}

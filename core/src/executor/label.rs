use super::types::TaskResult;

/// Human duration: `850ms`, `1.2s`, `2m05s`.
pub fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        format!("{}m{:02}s", ms / 60_000, (ms % 60_000) / 1_000)
    }
}

/// Expand `{key}`, `{path}`, `{summary}` and `{duration}` in a label template.
pub fn render_label(template: &str, result: &TaskResult) -> String {
    template
        .replace("{key}", &result.key)
        .replace("{path}", &result.path)
        .replace("{summary}", &result.summary_line)
        .replace("{duration}", &format_duration(result.duration_ms))
}

/// Replace the summary line with the matching label, if one is configured.
///
/// Suppressed results keep their attribution summary.
pub fn apply_labels(result: &mut TaskResult, success: Option<&str>, failure: Option<&str>) {
    let template = if result.ok {
        success
    } else if !result.suppressed {
        failure
    } else {
        None
    };
    if let Some(template) = template {
        result.summary_line = render_label(template, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(12), "12ms");
        assert_eq!(format_duration(1_250), "1.2s");
        assert_eq!(format_duration(125_000), "2m05s");
    }

    #[test]
    fn labels_expand_placeholders() {
        let mut result = TaskResult::no_op("tsc", "lint:tsc");
        result.summary_line = "0 errors".into();
        result.duration_ms = 40;
        apply_labels(&mut result, Some("{path} clean ({summary}, {duration})"), Some("x"));
        assert_eq!(result.summary_line, "lint:tsc clean (0 errors, 40ms)");
    }

    #[test]
    fn suppressed_results_keep_summary() {
        let mut result = TaskResult::no_op("build", "build");
        result.summary_line = "terminated".into();
        result.suppress("format");
        apply_labels(&mut result, Some("ok"), Some("{key} broke"));
        assert_eq!(result.summary_line, "terminated");

        let mut failed = TaskResult::no_op("build", "build");
        failed.ok = false;
        apply_labels(&mut failed, Some("ok"), Some("{key} broke"));
        assert_eq!(failed.summary_line, "build broke");
    }
}

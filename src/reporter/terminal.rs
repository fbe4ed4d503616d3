use crate::aggregator::{AggregateManifest, ScanBundle};
use crate::reporter::Reporter;
use colored::Colorize;

pub struct TerminalReporter {
    verbose: bool,
}

impl TerminalReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn format_section(&self, title: &str, manifest: &AggregateManifest) -> String {
        let mut output = format!("{}\n", title.bold());

        if manifest.is_empty() {
            output.push_str(&format!("  {}\n", "nothing collected".dimmed()));
            return output;
        }

        let width = manifest.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
        for (id, path) in manifest.iter() {
            output.push_str(&format!(
                "  {} {:<width$}  {}\n",
                "✓".green(),
                id.cyan(),
                path.display().to_string().dimmed(),
                width = width
            ));
        }
        output
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, bundle: &ScanBundle) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            format!("posture-audit v{}", env!("CARGO_PKG_VERSION")).bold()
        ));
        output.push_str(&format!("Scanning: {}\n", bundle.target.display()));
        if self.verbose {
            output.push_str(&format!(
                "Scanned at: {}\n",
                bundle.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        output.push('\n');

        output.push_str(&self.format_section("Configuration files", &bundle.config_files));
        output.push_str(&self.format_section("Cloud IaC", &bundle.cloud));
        output.push_str(&self.format_section("External scans", &bundle.additional_scans));

        output.push_str(&format!("{}\n", "CI/CD".bold()));
        match &bundle.ci_cd_tool {
            Some(tool) => output.push_str(&format!("  {} {}\n", "✓".green(), tool.cyan())),
            None => output.push_str(&format!("  {} {}\n", "✗".red(), "no CI/CD tool detected".yellow())),
        }

        output.push_str(&format!("{}\n", "━".repeat(50)));
        output.push_str(&format!(
            "Summary: {} collected, {} failed rule(s)\n",
            bundle.entry_count().to_string().green().bold(),
            if bundle.failed_rules.is_empty() {
                "0".normal()
            } else {
                bundle.failed_rules.len().to_string().red().bold()
            }
        ));
        for rule in bundle.failed_rules.as_slice() {
            output.push_str(&format!("  {} {}\n", "FAIL".red().bold(), rule));
        }

        output
    }
}

use std::path::Path;

use serde::Serialize;
use smfkit::{FeatureFormat, MapConfig, SectionSet};

use crate::{
    app::GlobalOptions,
    commands::common::{default_prefix, load_document},
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
pub struct ExtractResult {
    pub written: Vec<String>,
    pub skipped: Vec<SectionOutcome>,
    pub failed: Vec<SectionOutcome>,
}

#[derive(Debug, Serialize)]
pub struct SectionOutcome {
    pub section: String,
    pub reason: String,
}

pub fn run(
    path: &Path,
    output: Option<&Path>,
    sections: &str,
    lua: bool,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let sections = SectionSet::parse_list(sections)?;
    let prefix = output.map_or_else(|| default_prefix(path), Path::to_path_buf);
    let format = if lua {
        FeatureFormat::Lua
    } else {
        FeatureFormat::Csv
    };

    let document = load_document(path, MapConfig::default())?;
    let report = document.extract(&prefix, sections, format)?;

    let outcome = |(kind, reason): &(smfkit::SectionKind, String)| SectionOutcome {
        section: kind.to_string(),
        reason: reason.clone(),
    };
    let result = ExtractResult {
        written: report
            .written
            .iter()
            .map(|path| path.display().to_string())
            .collect(),
        skipped: report.skipped.iter().map(outcome).collect(),
        failed: report.failed.iter().map(outcome).collect(),
    };

    print_output(&result, opts, |result| {
        for file in &result.written {
            println!("Wrote {file}");
        }

        if !result.skipped.is_empty() || !result.failed.is_empty() {
            println!();
            let mut tw = TabWriter::new(&[
                ("Section", Align::Left),
                ("Status", Align::Left),
                ("Reason", Align::Left),
            ]);
            for entry in &result.skipped {
                tw.row(vec![entry.section.clone(), "skipped".into(), entry.reason.clone()]);
            }
            for entry in &result.failed {
                tw.row(vec![entry.section.clone(), "failed".into(), entry.reason.clone()]);
            }
            tw.print();
        }
    })?;

    if !report.is_complete() {
        anyhow::bail!("{} of the selected sections failed", report.failed.len());
    }
    Ok(())
}

use anyhow::Result;

use crate::workflow::SearchReport;

/// Print a plain-text representation of the report.
pub(crate) fn print_plain(report: &SearchReport) {
	print!("{}", format_plain(report));
}

fn format_plain(report: &SearchReport) -> String {
	let mut out = format!("{}  {}  ({})\n", report.counter, report.query, report.phase);
	for entry in &report.matches {
		let marker = if entry.current { '>' } else { ' ' };
		let section = entry.section.as_deref().unwrap_or("-");
		out.push_str(&format!(
			"{marker} {:>3}  [{section}]  {}\n",
			entry.index, entry.context
		));
	}
	if report.matches.is_empty() {
		out.push_str("No matches\n");
	}
	out
}

/// Format the report as a JSON string.
pub(crate) fn format_report_json(report: &SearchReport) -> Result<String> {
	Ok(serde_json::to_string_pretty(report)?)
}

/// Print the JSON representation of the report.
pub(crate) fn print_json(report: &SearchReport) -> Result<()> {
	println!("{}", format_report_json(report)?);
	Ok(())
}

#[cfg(test)]
mod tests {
	use docfind_core::Phase;
	use docfind_core::search::MatchOptions;
	use serde_json::Value;

	use super::*;
	use crate::workflow::MatchReport;

	fn report() -> SearchReport {
		SearchReport {
			document: "/tmp/notes.md".into(),
			query: "fox".into(),
			options: MatchOptions::default(),
			phase: Phase::Settled,
			counter: "1/2".into(),
			matches: vec![
				MatchReport {
					index: 1,
					text: "fox".into(),
					context: "The quick fox".into(),
					section: Some("intro".into()),
					current: true,
				},
				MatchReport {
					index: 2,
					text: "Fox".into(),
					context: "Fox again".into(),
					section: None,
					current: false,
				},
			],
		}
	}

	#[test]
	fn json_format_includes_matches() {
		let json = format_report_json(&report()).expect("json");
		let value: Value = serde_json::from_str(&json).expect("parse");
		assert_eq!(value["phase"], "settled");
		assert_eq!(value["counter"], "1/2");
		assert_eq!(value["options"]["whole_words"], false);
		assert_eq!(value["matches"][0]["section"], "intro");
		assert_eq!(value["matches"][1]["section"], Value::Null);
	}

	#[test]
	fn plain_format_marks_the_current_match() {
		insta::assert_snapshot!(format_plain(&report()), @r"
		1/2  fox  (settled)
		>   1  [intro]  The quick fox
		    2  [-]  Fox again
		");
	}
}

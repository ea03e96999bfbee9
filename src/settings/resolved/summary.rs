use super::ResolvedConfig;

pub(super) fn summary_lines(config: &ResolvedConfig) -> Vec<String> {
	let search = &config.search;
	let mut lines = vec![
		"Effective configuration:".to_owned(),
		format!("  Document: {}", config.document.display()),
		format!("  Debounce: {} ms", search.debounce.as_millis()),
		format!("  Chunk size: {}", search.chunk_size),
		format!("  Chunk pause: {} ms", search.chunk_pause.as_millis()),
		format!("  Minimum term length: {}", search.min_term_chars),
		format!("  Case sensitive: {}", bool_to_word(search.options.case_sensitive)),
		format!("  Whole words: {}", bool_to_word(search.options.whole_words)),
	];
	if let Some(query) = &config.initial_query {
		lines.push(format!("  Initial query: {query}"));
	}
	if let Some(title) = &config.title {
		lines.push(format!("  Prompt title: {title}"));
	}
	lines.push(format!("  Table of contents: {}", bool_to_word(config.show_toc)));
	lines.push(format!(
		"  Status timing: {} ms / {} ms",
		config.flash.success.as_millis(),
		config.flash.error.as_millis()
	));
	lines.push(format!("  Tick: {} ms", config.tick.as_millis()));
	lines.push(format!("  Log level: {}", config.log_level));
	lines
}

fn bool_to_word(value: bool) -> &'static str {
	if value { "yes" } else { "no" }
}

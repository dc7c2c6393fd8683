use caseless::default_case_fold_str;
use memos_client::Memo;

/// Substring test over content, snippet and tags after Unicode case folding of both sides.
pub fn matches_keyword(content: &str, snippet: &str, tags: &[String], query: &str) -> bool {
	let haystack = format!("{content}\n{snippet}\n{}", tags.join(" "));

	default_case_fold_str(&haystack).contains(&default_case_fold_str(query))
}

pub fn memo_matches(memo: &Memo, query: &str) -> bool {
	matches_keyword(&memo.content, &memo.snippet, &memo.tags, query)
}

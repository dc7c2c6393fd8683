//! Date boundary resolution and lenient ISO-8601 timestamp parsing.
//!
//! "Local" means a fixed UTC offset resolved once per invocation, so every bound and every
//! naive timestamp within one search agrees on the zone.

use time::{
	Date, OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::well_known::Rfc3339,
	macros::{format_description, time},
};

use crate::{Error, Result};

const DATE_ONLY_LEN: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundEdge {
	Start,
	End,
}

/// A resolved UTC instant and the edge of the range it anchors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateBound {
	pub at: OffsetDateTime,
	pub edge: BoundEdge,
}
impl DateBound {
	pub fn unix_seconds(&self) -> i64 {
		self.at.unix_timestamp()
	}
}

/// Configured offset, else the process offset, else UTC.
pub fn local_offset(configured: Option<UtcOffset>) -> UtcOffset {
	configured.or_else(|| UtcOffset::current_local_offset().ok()).unwrap_or(UtcOffset::UTC)
}

/// Blank input yields no bound. A `YYYY-MM-DD` value covers the whole local day: start bounds
/// land on local midnight, end bounds on 23:59:59 local.
pub fn resolve_bound(
	raw: Option<&str>,
	edge: BoundEdge,
	offset: UtcOffset,
) -> Result<Option<DateBound>> {
	let Some(raw) = raw else {
		return Ok(None);
	};
	let text = raw.trim();

	if text.is_empty() {
		return Ok(None);
	}

	let at = if text.chars().count() == DATE_ONLY_LEN {
		parse_day(text, edge, offset)
	} else {
		parse_timestamp(text, offset)
	};

	match at {
		Some(at) => Ok(Some(DateBound { at, edge })),
		None => Err(Error::InvalidDateFormat { raw: raw.to_string() }),
	}
}

pub fn check_range(start: Option<&DateBound>, end: Option<&DateBound>) -> Result<()> {
	match (start, end) {
		(Some(start), Some(end)) if start.at > end.at => Err(Error::InvalidDateRange),
		_ => Ok(()),
	}
}

/// Parses a full timestamp into UTC. Accepts `T` or a single space as the separator, optional
/// seconds and fraction, and an optional `Z` or `±HH:MM` offset. Naive values take `offset`.
pub fn parse_timestamp(text: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
	let normalized = normalize_timestamp(text);

	parse_with_offset(&normalized)
		.or_else(|| parse_naive(&normalized).map(|naive| naive.assume_offset(offset)))
		.map(|at| at.to_offset(UtcOffset::UTC))
}

fn parse_day(text: &str, edge: BoundEdge, offset: UtcOffset) -> Option<OffsetDateTime> {
	let day = Date::parse(text, format_description!("[year]-[month]-[day]")).ok()?;
	let local = match edge {
		BoundEdge::Start => day.midnight(),
		BoundEdge::End => PrimitiveDateTime::new(day, time!(23:59:59)),
	};

	Some(local.assume_offset(offset).to_offset(UtcOffset::UTC))
}

fn normalize_timestamp(text: &str) -> String {
	let trimmed = text.trim();
	let mut normalized = match trimmed.strip_suffix(['Z', 'z']) {
		Some(rest) => format!("{rest}+00:00"),
		None => trimmed.to_string(),
	};

	if normalized.as_bytes().get(DATE_ONLY_LEN) == Some(&b' ') {
		normalized.replace_range(DATE_ONLY_LEN..DATE_ONLY_LEN + 1, "T");
	}

	normalized
}

fn parse_with_offset(text: &str) -> Option<OffsetDateTime> {
	OffsetDateTime::parse(text, &Rfc3339)
		.or_else(|_| {
			OffsetDateTime::parse(
				text,
				format_description!(
					"[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
				),
			)
		})
		.or_else(|_| {
			OffsetDateTime::parse(
				text,
				format_description!(
					"[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
				),
			)
		})
		.or_else(|_| {
			OffsetDateTime::parse(
				text,
				format_description!(
					"[year]-[month]-[day]T[hour]:[minute][offset_hour sign:mandatory]:[offset_minute]"
				),
			)
		})
		.ok()
}

fn parse_naive(text: &str) -> Option<PrimitiveDateTime> {
	PrimitiveDateTime::parse(
		text,
		format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
	)
	.or_else(|_| {
		PrimitiveDateTime::parse(
			text,
			format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
		)
	})
	.or_else(|_| {
		PrimitiveDateTime::parse(text, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
	})
	.ok()
}

#[cfg(test)]
mod tests {
	use time::macros::{datetime, offset};

	use super::*;

	#[test]
	fn blank_input_is_no_bound() {
		assert_eq!(resolve_bound(None, BoundEdge::Start, UtcOffset::UTC).expect("bound"), None);
		assert_eq!(resolve_bound(Some("  "), BoundEdge::End, UtcOffset::UTC).expect("bound"), None);
	}

	#[test]
	fn date_only_expands_to_local_day_edges() {
		let start = resolve_bound(Some("2024-01-01"), BoundEdge::Start, offset!(+8))
			.expect("start")
			.expect("bound");
		let end = resolve_bound(Some("2024-01-01"), BoundEdge::End, offset!(+8))
			.expect("end")
			.expect("bound");

		assert_eq!(start.at, datetime!(2023-12-31 16:00:00 UTC));
		assert_eq!(end.at, datetime!(2024-01-01 15:59:59 UTC));
		assert_eq!(start.unix_seconds(), 1_704_038_400);
		assert_eq!(end.edge, BoundEdge::End);
	}

	#[test]
	fn timestamps_accept_z_offsets_and_naive_values() {
		let utc = parse_timestamp("2024-01-01T04:00:00Z", offset!(+8)).expect("utc");
		let offset = parse_timestamp("2024-01-01T12:00:00+08:00", UtcOffset::UTC).expect("offset");
		let naive = parse_timestamp("2024-01-01 12:00", offset!(+8)).expect("naive");
		let fraction =
			parse_timestamp("2024-01-01T04:00:00.123456Z", UtcOffset::UTC).expect("fraction");

		assert_eq!(utc, datetime!(2024-01-01 04:00:00 UTC));
		assert_eq!(offset, utc);
		assert_eq!(naive, utc);
		assert_eq!(fraction.unix_timestamp(), utc.unix_timestamp());
	}

	#[test]
	fn garbage_is_an_invalid_format() {
		let err = resolve_bound(Some("yesterday"), BoundEdge::Start, UtcOffset::UTC)
			.expect_err("expected format error");

		assert_eq!(err.to_string(), "invalid date format: yesterday");
		assert!(resolve_bound(Some("2024-13-01"), BoundEdge::Start, UtcOffset::UTC).is_err());
		assert_eq!(parse_timestamp("", UtcOffset::UTC), None);
	}

	#[test]
	fn start_after_end_is_rejected() {
		let start = resolve_bound(Some("2024-02-01"), BoundEdge::Start, UtcOffset::UTC)
			.expect("start");
		let end = resolve_bound(Some("2024-01-01"), BoundEdge::End, UtcOffset::UTC).expect("end");

		assert!(matches!(
			check_range(start.as_ref(), end.as_ref()),
			Err(Error::InvalidDateRange)
		));
		assert!(check_range(start.as_ref(), None).is_ok());
	}

	#[test]
	fn configured_offset_wins() {
		assert_eq!(local_offset(Some(offset!(-5))), offset!(-5));
	}
}

//! Byte counts for progress lines and the end-of-run report.

const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Formats a byte count with decimal (1000-based) units, e.g. `1.5 kB`.
///
/// A trailing `.0` is dropped (`1 MB`, not `1.0 MB`). Anything past
/// exabytes stays in `EB`.
pub fn humanize_bytes(n: u64) -> String {
	let mut value = n as f64;
	for (i, unit) in UNITS.iter().enumerate() {
		if value < 1000.0 || i == UNITS.len() - 1 {
			return format!("{:.1} {}", value, unit).replace(".0 ", " ");
		}
		value /= 1000.0;
	}
	unreachable!("the last unit always returns")
}

/// `1500 bytes (1.5 kB)`
pub fn bytes_string(n: u64) -> String {
	format!("{} bytes ({})", n, humanize_bytes(n))
}

/// Running totals of bytes before and after compression for one run.
///
/// Each pipeline run owns its own ledger, so runs never share totals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SizeLedger {
	pub original: u64,
	pub compressed: u64,
}

impl SizeLedger {
	pub fn new() -> SizeLedger {
		SizeLedger::default()
	}

	pub fn record(&mut self, before: u64, after: u64) {
		self.original += before;
		self.compressed += after;
	}

	/// True when nothing has been compressed yet.
	pub fn is_empty(&self) -> bool {
		self.original == 0
	}

	/// Compressed size as a percentage of the original size, 0 when nothing was compressed.
	pub fn ratio(&self) -> f64 {
		if self.original == 0 {
			return 0.0;
		}
		self.compressed as f64 / self.original as f64 * 100.0
	}
}

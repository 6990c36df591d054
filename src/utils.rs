//! Size and unit conversion helpers
//!
//! Export pages label each part with a human-readable size ("2.5 GB"). These
//! helpers turn such a label into a byte count and render byte counts back
//! for status output. Both directions use binary (1024-based) multipliers.

/// Size unit as printed on an export page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeUnit {
    /// Plain bytes, also used for any unit we don't recognize
    Bytes,
    /// Kibibytes
    Kilobytes,
    /// Mebibytes
    Megabytes,
    /// Gibibytes
    Gigabytes,
    /// Tebibytes
    Terabytes,
}

impl SizeUnit {
    /// Parse a unit label; anything unrecognized counts as bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use takeout_dl::utils::SizeUnit;
    ///
    /// assert_eq!(SizeUnit::parse("GB"), SizeUnit::Gigabytes);
    /// assert_eq!(SizeUnit::parse("parsecs"), SizeUnit::Bytes);
    /// ```
    pub fn parse(label: &str) -> Self {
        match label {
            "KB" => SizeUnit::Kilobytes,
            "MB" => SizeUnit::Megabytes,
            "GB" => SizeUnit::Gigabytes,
            "TB" => SizeUnit::Terabytes,
            _ => SizeUnit::Bytes,
        }
    }

    /// Number of bytes in one of this unit
    pub fn multiplier(self) -> u64 {
        match self {
            SizeUnit::Bytes => 1,
            SizeUnit::Kilobytes => 1 << 10,
            SizeUnit::Megabytes => 1 << 20,
            SizeUnit::Gigabytes => 1 << 30,
            SizeUnit::Terabytes => 1 << 40,
        }
    }
}

impl From<&str> for SizeUnit {
    fn from(label: &str) -> Self {
        SizeUnit::parse(label)
    }
}

/// Unit names used when rendering, indexed by the number of 1024 divisions
const UNIT_LADDER: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Convert a size label value into bytes
///
/// Fractional results are rounded to the nearest byte; negative or NaN
/// inputs saturate to zero.
///
/// # Examples
///
/// ```
/// use takeout_dl::utils::{SizeUnit, size_as_bytes};
///
/// assert_eq!(size_as_bytes(1.5, SizeUnit::Gigabytes), 1_610_612_736);
/// assert_eq!(size_as_bytes(12.0, SizeUnit::parse("B")), 12);
/// ```
#[must_use]
pub fn size_as_bytes(value: f64, unit: SizeUnit) -> u64 {
    (value * unit.multiplier() as f64).round() as u64
}

/// Render a byte count with two decimals and the largest fitting unit
///
/// Divides by 1024 while the value is still above 1024, so exactly 1024
/// bytes renders as `"1024.00 B"`. Values past petabytes render with `"?B"`.
///
/// # Examples
///
/// ```
/// use takeout_dl::utils::pretty_size;
///
/// assert_eq!(pretty_size(1_610_612_736), "1.50 GB");
/// assert_eq!(pretty_size(512), "512.00 B");
/// ```
#[must_use]
pub fn pretty_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut divisions = 0;
    while size > 1024.0 {
        size /= 1024.0;
        divisions += 1;
    }
    let unit = UNIT_LADDER.get(divisions).copied().unwrap_or("?B");
    format!("{size:.2} {unit}")
}

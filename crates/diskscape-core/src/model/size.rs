//! Size formatting utilities — human-readable byte counts.
//!
//! All internal sizes are `u64` bytes. Floating point is only used
//! at the display-formatting boundary.

use crate::config::SizePrefix;

/// Format a byte count into a human-readable string.
///
/// `SizePrefix::Binary` uses 1 KiB = 1024 B with IEC labels;
/// `SizePrefix::Decimal` uses 1 kB = 1000 B with SI labels.
pub fn format_size(bytes: u64, prefix: SizePrefix) -> String {
    let (base, labels) = match prefix {
        SizePrefix::Binary => (1024.0, ["KiB", "MiB", "GiB", "TiB"]),
        SizePrefix::Decimal => (1000.0, ["kB", "MB", "GB", "TB"]),
    };

    let b = bytes as f64;
    if b < base {
        return format!("{bytes} B");
    }

    let mut value = b / base;
    let mut label = labels[0];
    for next in &labels[1..] {
        if value < base {
            break;
        }
        value /= base;
        label = next;
    }

    if value < 100.0 {
        format!("{value:.1} {label}")
    } else {
        format!("{value:.0} {label}")
    }
}

/// Format a file count with thousand separators.
pub fn format_count(count: u64) -> String {
    if count < 1_000 {
        return count.to_string();
    }
    let s = count.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_bytes() {
        assert_eq!(format_size(0, SizePrefix::Binary), "0 B");
        assert_eq!(format_size(512, SizePrefix::Binary), "512 B");
        assert_eq!(format_size(1023, SizePrefix::Binary), "1023 B");
        assert_eq!(format_size(999, SizePrefix::Decimal), "999 B");
    }

    #[test]
    fn test_format_size_binary_units() {
        assert_eq!(format_size(1024, SizePrefix::Binary), "1.0 KiB");
        assert_eq!(format_size(1536, SizePrefix::Binary), "1.5 KiB");
        assert_eq!(format_size(1_048_576, SizePrefix::Binary), "1.0 MiB");
        assert_eq!(format_size(1_073_741_824, SizePrefix::Binary), "1.0 GiB");
        assert_eq!(format_size(1_099_511_627_776, SizePrefix::Binary), "1.0 TiB");
    }

    #[test]
    fn test_format_size_decimal_units() {
        assert_eq!(format_size(1_000, SizePrefix::Decimal), "1.0 kB");
        assert_eq!(format_size(1_500_000, SizePrefix::Decimal), "1.5 MB");
        assert_eq!(format_size(2_000_000_000, SizePrefix::Decimal), "2.0 GB");
    }

    #[test]
    fn test_format_size_wide_values() {
        // Three digits drop the fractional part.
        assert_eq!(format_size(150 * 1024, SizePrefix::Binary), "150 KiB");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }
}

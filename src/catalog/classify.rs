//! Column classification rules
//!
//! A column is "binary/oversized" when its type names a large object,
//! byte array or text type, or when it is a variable-length character
//! column wider than `max_text_size`. Such columns are projected but never
//! ordered by.

/// Case-insensitive type-name markers for large-object and byte types
const LARGE_OBJECT_MARKERS: [&str; 5] = ["lob", "clob", "blob", "bytea", "text"];

/// Exact numeric type names that receive a decimal format
const NUMERIC_TYPES: [&str; 4] = ["decimal", "number", "numeric", "double"];

/// Placeholder digit in a decimal format pattern
const PLACEHOLDER: char = '#';

/// Returns true for large-object, byte-array and text types
pub fn is_large_object(type_name: &str) -> bool {
    let lower = type_name.to_ascii_lowercase();
    LARGE_OBJECT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Returns true for a varchar-family column wider than `max_text_size`
pub fn is_oversized_varchar(type_name: &str, size: u32, max_text_size: u32) -> bool {
    type_name.to_ascii_lowercase().contains("varchar") && size > max_text_size
}

/// Returns true when a column may be projected but not ordered by
pub fn is_binary_or_oversized(type_name: &str, size: u32, max_text_size: u32) -> bool {
    is_large_object(type_name) || is_oversized_varchar(type_name, size, max_text_size)
}

/// Returns true for numeric, float and double types
pub fn is_numeric_family(type_name: &str) -> bool {
    let lower = type_name.to_ascii_lowercase();
    NUMERIC_TYPES.contains(&lower.as_str()) || lower.contains("float")
}

/// Returns true for date, time and timestamp types
pub fn is_temporal(type_name: &str) -> bool {
    let lower = type_name.to_ascii_lowercase();
    lower.contains("date") || lower.contains("timestamp")
}

/// Builds the rounding pattern used to render a numeric column.
///
/// `size` placeholder digits, then `min(decimals, max_decimals)` zeros
/// after a decimal point when that count is positive (a `max_decimals`
/// of zero leaves `decimals` uncapped). A placeholder directly before the
/// point becomes a literal zero so that zero renders as `0.00`, not `.00`.
/// Non-numeric columns get an empty pattern.
pub fn decimal_format(type_name: &str, size: u32, decimals: u32, max_decimals: u32) -> String {
    if !is_numeric_family(type_name) {
        return String::new();
    }

    let mut format: String = std::iter::repeat(PLACEHOLDER).take(size as usize).collect();

    let fraction = if max_decimals > 0 {
        decimals.min(max_decimals)
    } else {
        decimals
    };

    if fraction > 0 {
        if format.is_empty() {
            format.push(PLACEHOLDER);
        }
        format.push('.');
        format.extend(std::iter::repeat('0').take(fraction as usize));
    }

    format.replace("#.", "0.")
}

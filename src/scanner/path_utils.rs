//! Unicode filename normalization utilities.
//!
//! Cache keys, index rows and resolver lookups are all keyed by bare
//! filename, so the same magazine must produce the same key regardless of
//! the platform that listed it.
//!
//! # Background
//!
//! macOS uses NFD (Decomposed) normalization for file paths, while Windows
//! and Linux typically use NFC (Composed) normalization. This means the same
//! visual filename can have different byte representations:
//!
//! - NFC: `Motorrad_Ausgabe_Mär.pdf` - 'ä' is U+00E4 (single code point)
//! - NFD: `Motorrad_Ausgabe_Mär.pdf` - 'a' U+0061 + combining diaeresis U+0308
//!
//! # Example
//!
//! ```
//! use magsearch::scanner::path_utils::normalize_name;
//!
//! let nfc = "Mär.pdf";
//! let nfd = "Ma\u{0308}r.pdf";
//! assert_eq!(normalize_name(nfc), normalize_name(nfd));
//! ```

use std::path::Path;
use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

/// Normalize a filename to NFC (Composed) form.
#[must_use]
pub fn normalize_name(s: &str) -> String {
    if is_nfc(s) {
        s.to_string()
    } else {
        s.nfc().collect()
    }
}

/// Check whether a string is already in NFC form.
#[must_use]
pub fn is_nfc(s: &str) -> bool {
    match is_nfc_quick(s.chars()) {
        IsNormalized::Yes => true,
        IsNormalized::No => false,
        IsNormalized::Maybe => s.nfc().eq(s.chars()),
    }
}

/// Extract the NFC-normalized bare filename of a path.
///
/// Returns `None` for paths without a final component (e.g. `/` or `..`).
/// Non-UTF-8 names are converted lossily.
#[must_use]
pub fn file_name_key(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| normalize_name(&name.to_string_lossy()))
}

/// Check whether a path has a `.pdf` extension (case-insensitive).
#[must_use]
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

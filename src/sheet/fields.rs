//! Typed accessors over tree nodes. Every section extractor goes through
//! these, so their fallback behavior decides what every displayed stat
//! looks like when the export leaves a field out.

use super::tree::{NodeId, SheetDoc};

/// Trimmed text content of the first node matched by `sel`, else `""`.
pub fn text_of(doc: &SheetDoc, node: NodeId, sel: &str) -> String {
    match doc.select(node, sel) {
        Some(n) => doc.text_content(n).trim().to_string(),
        None => String::new(),
    }
}

/// Numeric value of the first node matched by `sel`. Absent, empty,
/// non-numeric, and non-finite text all yield `fallback`, never an error.
pub fn number_of(doc: &SheetDoc, node: NodeId, sel: &str, fallback: f64) -> f64 {
    opt_number_of(doc, node, sel).unwrap_or(fallback)
}

/// Like [`number_of`] but keeps "no data" distinct from any numeric value.
pub fn opt_number_of(doc: &SheetDoc, node: NodeId, sel: &str) -> Option<f64> {
    let text = text_of(doc, node, sel);
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Signed display form: `+0` for exactly zero, `+N` / `-N` otherwise,
/// empty for non-finite input. Integral values print without a fraction.
pub fn format_signed(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }
    if n > 0.0 {
        format!("+{n}")
    } else if n < 0.0 {
        format!("{n}")
    } else {
        "+0".to_string()
    }
}

/// Plain display form for a number: integral values without a fraction.
pub fn format_number(n: f64) -> String {
    format!("{n}")
}

#[cfg(test)]
mod tests {
    use super::{format_signed, number_of, opt_number_of, text_of};
    use crate::sheet::tree::parse_document;

    #[test]
    fn text_of_trims_and_defaults_empty() {
        let doc = parse_document("<root><item><name>  Longsword \n</name></item></root>")
            .expect("parse");
        let root = doc.root().expect("root");
        assert_eq!(text_of(&doc, root, "item name"), "Longsword");
        assert_eq!(text_of(&doc, root, "missing"), "");
        assert_eq!(text_of(&doc, root, "item missing"), "");
    }

    #[test]
    fn number_of_falls_back_on_bad_text() {
        let doc =
            parse_document("<root><count>3</count><junk>abc</junk><blank></blank></root>")
                .expect("parse");
        let root = doc.root().expect("root");
        assert_eq!(number_of(&doc, root, "count", 1.0), 3.0);
        assert_eq!(number_of(&doc, root, "junk", 1.0), 1.0);
        assert_eq!(number_of(&doc, root, "blank", 1.0), 1.0);
        assert_eq!(number_of(&doc, root, "missing", 7.0), 7.0);
        assert_eq!(opt_number_of(&doc, root, "junk"), None);
        assert_eq!(opt_number_of(&doc, root, "count"), Some(3.0));
    }

    #[test]
    fn signed_format_cases() {
        assert_eq!(format_signed(0.0), "+0");
        assert_eq!(format_signed(5.0), "+5");
        assert_eq!(format_signed(-3.0), "-3");
        assert_eq!(format_signed(2.5), "+2.5");
        assert_eq!(format_signed(f64::NAN), "");
        assert_eq!(format_signed(f64::INFINITY), "");
        assert_eq!(format_signed(f64::NEG_INFINITY), "");
    }
}

//! In-document calculation scripts
//!
//! The total-hours field carries an AcroForm JavaScript action that re-sums
//! the twelve monthly hour fields whenever a viewer recalculates. The field
//! names are Korean, and the script container is not guaranteed to preserve
//! raw multi-byte text, so every name is Unicode-escaped before embedding.

/// Escape a string for embedding inside a JavaScript string literal
///
/// Every UTF-16 code unit becomes a `\uXXXX` escape, so the generated source
/// is plain ASCII regardless of the input.
pub fn escape_for_script(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 6);
    for unit in s.encode_utf16() {
        out.push_str(&format!("\\u{unit:04X}"));
    }
    out
}

/// Build the on-calculate script summing the given fields into `event.value`
///
/// The sum is written back when nonzero; a zero sum clears the field to the
/// empty string so the flattened total cell stays blank, matching the
/// zero-as-blank convention used for the monthly cells.
pub fn build_sum_script(field_names: &[String]) -> String {
    let escaped: Vec<String> = field_names
        .iter()
        .map(|n| format!("\"{}\"", escape_for_script(n)))
        .collect();

    format!(
        "var total = Number(0);\n\
         var fNames = [{}];\n\
         for (var i = 0; i < fNames.length; i++) {{\n\
         \x20   var field = this.getField(fNames[i]);\n\
         \x20   if (field && field.value !== \"\") {{\n\
         \x20       total = Number(total) + Number(field.value);\n\
         \x20   }}\n\
         }}\n\
         if (total == 0) {{\n\
         \x20   event.value = \"\";\n\
         }} else {{\n\
         \x20   event.value = total;\n\
         }}\n",
        escaped.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_ascii() {
        assert_eq!(escape_for_script("A1"), "\\u0041\\u0031");
    }

    #[test]
    fn test_escape_korean() {
        // '시' U+C2DC, '간' U+AC04
        assert_eq!(escape_for_script("시간"), "\\uC2DC\\uAC04");
    }

    #[test]
    fn test_escape_empty() {
        assert_eq!(escape_for_script(""), "");
    }

    #[test]
    fn test_escaped_output_is_ascii() {
        assert!(escape_for_script("9월 봉사에 참여했음").is_ascii());
    }

    #[test]
    fn test_sum_script_contains_escaped_names() {
        let names = vec!["9월 시간".to_string(), "10월 시간".to_string()];
        let script = build_sum_script(&names);

        assert!(script.is_ascii());
        assert!(script.contains(&format!("\"{}\"", escape_for_script("9월 시간"))));
        assert!(script.contains(&format!("\"{}\"", escape_for_script("10월 시간"))));
        assert!(script.contains("event.value = \"\""));
        assert!(script.contains("event.value = total"));
    }

    #[test]
    fn test_sum_script_empty_field_list() {
        let script = build_sum_script(&[]);
        assert!(script.contains("var fNames = [];"));
    }
}

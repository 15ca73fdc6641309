/// Canonical extension keywords recognized as whole words in a query
/// (spec.md §4.6: "PDFs"→"pdf", "markdown"→"md").
const KEYWORDS: &[(&str, &str)] = &[
    ("pdf", "pdf"),
    ("pdfs", "pdf"),
    ("markdown", "md"),
    ("md", "md"),
    ("text", "txt"),
    ("txt", "txt"),
    ("word", "docx"),
    ("docx", "docx"),
    ("doc", "docx"),
    ("excel", "xlsx"),
    ("xlsx", "xlsx"),
    ("spreadsheet", "xlsx"),
    ("spreadsheets", "xlsx"),
    ("powerpoint", "pptx"),
    ("pptx", "pptx"),
    ("slides", "pptx"),
    ("csv", "csv"),
    ("json", "json"),
    ("image", "jpg"),
    ("images", "jpg"),
    ("photo", "jpg"),
    ("photos", "jpg"),
    ("picture", "jpg"),
    ("pictures", "jpg"),
    ("png", "png"),
    ("jpg", "jpg"),
    ("jpeg", "jpg"),
];

/// Detect a canonical extension from a whole-word match in the
/// lowercased query (spec.md §4.6 "Extension detection").
pub fn detect(query_lower: &str) -> Option<&'static str> {
    let tokens = manole_nlp::tokenize(query_lower);
    KEYWORDS
        .iter()
        .find(|(word, _)| tokens.iter().any(|t| t.as_str() == *word))
        .map(|(_, ext)| *ext)
}

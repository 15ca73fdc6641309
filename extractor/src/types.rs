/// One extracted chunk, ready to become a `manole_vector_store::Passage`.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub chunk_index: u32,
    pub page_number: Option<u32>,
    pub element_type: Option<String>,
}

/// A structural element the extractor recognized (heading, paragraph,
/// table, ...). Coarser-grained than a chunk; several chunks may belong
/// to the same element.
#[derive(Debug, Clone)]
pub struct Element {
    pub element_type: String,
    pub page_number: Option<u32>,
}

/// The full result of extracting one file.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub text: String,
    pub chunks: Vec<Chunk>,
    pub elements: Vec<Element>,
}

//! Tag value extraction for XML corpora
//!
//! Given a tag name, this crate finds every element with that name in a set
//! of XML documents and collects the distinct rendered forms of their child
//! elements. It is the analysis half of `xml-analyzer`; archive handling
//! lives in `xml-analyzer-archive`.
//!
//! # Usage
//!
//! ```no_run
//! use xml_analyzer_core::{list_xml_files, scan_files};
//! use std::path::Path;
//!
//! let files = list_xml_files(Path::new("corpus"));
//! let (values, summary) = scan_files(&files, "record");
//! println!("Files count: {}", summary.files);
//! for value in values.sorted() {
//!     println!("{value}");
//! }
//! ```
//!
//! Single documents can be analyzed directly:
//!
//! ```
//! use xml_analyzer_core::extract_from_str;
//!
//! let xml = r#"<records><record><field id="1">x</field></record></records>"#;
//! let values = extract_from_str(xml, "record").unwrap();
//! assert!(values.values.contains("field(id=1) = x"));
//! ```

pub mod decode;
pub mod error;
pub mod extract;
pub mod scan;

pub use decode::decode_document;
pub use error::{ExtractError, Result};
pub use extract::{extract_from_file, extract_from_str, extract_values, render_node, TagValues};
pub use scan::{list_xml_files, scan_files, ScanSummary};

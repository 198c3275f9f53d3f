//! Comment- and format-preserving YAML editing.
//!
//! ```
//! use yedit::Document;
//!
//! let mut doc = Document::load("name: test # Original name\nports: [80]\n").unwrap();
//! doc.set("name", "new-name").unwrap();
//! doc.append_to_array("ports", 443).unwrap();
//! assert_eq!(doc.to_string(), "name: new-name # Original name\nports: [80, 443]\n");
//! ```

pub mod yaml;

pub use yaml::{
    Document, EncodeOptions, Error, FromScalar, Kind, Node, Path, Pattern, RuleType, ScalarType,
    Segment, Style, ValidationRule, Value,
};

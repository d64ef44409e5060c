//! Utility functions shared by the mapper, chapter resolver and validator.
//!
//! - **URL checks**: well-formedness and internal-host detection
//! - **Text processing**: control-character stripping and HTML-to-lines conversion
//!
//! # Examples
//!
//! ```
//! use podfeed::util::{html_to_lines, strip_control_chars, validate_url};
//!
//! let url = validate_url("https://example.com/feed.xml").unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//!
//! assert_eq!(strip_control_chars("Title\x07"), "Title");
//! assert_eq!(html_to_lines("<p>a</p><p>b</p>"), vec!["a", "b"]);
//! ```

mod text;
mod url_validator;

pub use text::{html_to_lines, strip_control_chars};
pub use url_validator::{is_internal_host, validate_url, UrlValidationError};

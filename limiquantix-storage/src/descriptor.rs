//! Pool and volume XML descriptors.
//!
//! Builds the minimal descriptors handed to the pool API and reads single
//! values back out of the descriptors it returns.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Result, StorageError};

/// Pool type written into pool descriptors.
pub const POOL_TYPE: &str = "rbd";

/// Element chain of a volume's device path, innermost first.
pub const VOLUME_PATH: [&str; 3] = ["path", "target", "volume"];

/// Return the text inside the element chain `tag_path`.
///
/// `tag_path` lists element names innermost first, e.g.
/// `["path", "target", "volume"]` for `<volume><target><path>`. The first
/// text node (depth-first) whose full ancestor chain equals `tag_path` wins.
/// Attributes are ignored and the document is not validated beyond what the
/// tokenizer needs.
pub fn extract(descriptor: &str, tag_path: &[&str]) -> Result<String> {
    let mut reader = Reader::from_str(descriptor);
    reader.trim_text(true);

    let mut ancestors: Vec<String> = Vec::new();
    let at_path = |ancestors: &[String]| {
        ancestors.iter().rev().map(String::as_str).eq(tag_path.iter().copied())
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                ancestors.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::End(_)) => {
                ancestors.pop();
            }
            Ok(Event::Text(t)) if at_path(&ancestors) => {
                let text = t
                    .unescape()
                    .map_err(|e| StorageError::MalformedDescriptor(e.to_string()))?;
                return Ok(text.into_owned());
            }
            Ok(Event::CData(c)) if at_path(&ancestors) => {
                return Ok(String::from_utf8_lossy(&c.into_inner()).into_owned());
            }
            Ok(Event::Eof) => {
                return Err(StorageError::PathNotFound(
                    tag_path.iter().map(|t| t.to_string()).collect(),
                ));
            }
            Ok(_) => {}
            Err(e) => return Err(StorageError::MalformedDescriptor(e.to_string())),
        }
    }
}

/// Pool descriptor embedding the pool name and a caller-supplied fragment.
///
/// The fragment is inserted verbatim; it usually carries `<source>` and
/// `<target>` elements.
pub fn pool_xml(name: &str, fragment: &str) -> String {
    format!(
        r#"<pool type="{}">
  <name>{}</name>
  {}
</pool>"#,
        POOL_TYPE,
        escape(name),
        fragment
    )
}

/// Volume descriptor with only a name and a capacity in bytes.
pub fn volume_xml(name: &str, capacity_bytes: u64) -> String {
    format!(
        r#"<volume>
  <name>{}</name>
  <capacity unit="bytes">{}</capacity>
</volume>"#,
        escape(name),
        capacity_bytes
    )
}

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{EvioError, Result};

/// One dictionary entry: a human name for a (tag, num) pair. Entries from
/// nested `<bank>` elements carry dotted parent paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub name: String,
    pub tag: u16,
    pub num: Option<u8>,
}

/// Decoded XML dictionary.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    pub entries: Vec<DictEntry>,
}

impl Dictionary {
    /// Parse dictionary XML. `<dictEntry>`, `<bank>` and `<leaf>` elements
    /// are harvested; entries without a usable name and tag are skipped.
    pub fn parse(xml: &str) -> Result<Dictionary> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut entries = Vec::new();
        // Stack of enclosing <bank> names; children get dotted paths.
        let mut path: Vec<String> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let element = element_name(e);
                    if is_entry_element(&element) {
                        if let Some(entry) = harvest(e, &path) {
                            entries.push(entry);
                        }
                    }
                    if element == "bank" {
                        path.push(attribute(e, b"name").unwrap_or_default());
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    if is_entry_element(&element_name(e)) {
                        if let Some(entry) = harvest(e, &path) {
                            entries.push(entry);
                        }
                    }
                }
                Ok(Event::End(ref e)) => {
                    if e.local_name().as_ref().eq_ignore_ascii_case(b"bank") {
                        path.pop();
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(EvioError::Corruption(format!("dictionary XML: {e}")));
                }
                Ok(_) => {}
            }
        }

        Ok(Dictionary { entries })
    }

    /// Look up an entry: an exact (tag, num) match wins over a tag-only one.
    pub fn find(&self, tag: u16, num: Option<u8>) -> Option<&DictEntry> {
        self.entries
            .iter()
            .find(|e| e.tag == tag && e.num == num)
            .or_else(|| self.entries.iter().find(|e| e.tag == tag && e.num.is_none()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase()
}

fn is_entry_element(name: &str) -> bool {
    matches!(name, "dictentry" | "bank" | "leaf")
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn parse_number(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

fn harvest(e: &BytesStart, path: &[String]) -> Option<DictEntry> {
    let name = attribute(e, b"name")?;
    let tag = parse_number(&attribute(e, b"tag")?)?;
    let num = attribute(e, b"num").and_then(|v| parse_number(&v));

    let mut parts: Vec<&str> = path.iter().map(|s| s.as_str()).filter(|s| !s.is_empty()).collect();
    parts.push(&name);

    Some(DictEntry {
        name: parts.join("."),
        tag: tag as u16,
        num: num.map(|v| v as u8),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <xmlDict>
            <dictEntry name="run-control" tag="0xff60" num="1"/>
            <bank name="FADC" tag="5">
                <leaf name="adc" tag="5" num="1"/>
                <leaf name="tdc" tag="5" num="2"/>
            </bank>
            <dictEntry name="raw" tag="7"/>
        </xmlDict>
    "#;

    #[test]
    fn test_parse_entries() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        let names: Vec<&str> = dict.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["run-control", "FADC", "FADC.adc", "FADC.tdc", "raw"]
        );
        assert_eq!(dict.entries[0].tag, 0xff60);
        assert_eq!(dict.entries[0].num, Some(1));
        assert_eq!(dict.entries[4].num, None);
    }

    #[test]
    fn test_find_precedence() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        assert_eq!(dict.find(5, Some(2)).unwrap().name, "FADC.tdc");
        // No (5, 9) entry: the tag-only <bank> element matches.
        assert_eq!(dict.find(5, Some(9)).unwrap().name, "FADC");
        assert_eq!(dict.find(7, None).unwrap().name, "raw");
        assert!(dict.find(99, None).is_none());
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            Dictionary::parse("<xmlDict><dictEntry"),
            Err(EvioError::Corruption(_))
        ));
    }

    #[test]
    fn test_entries_without_tag_skipped() {
        let dict = Dictionary::parse(r#"<d><dictEntry name="x"/><dictEntry tag="1"/></d>"#).unwrap();
        assert!(dict.is_empty());
    }
}

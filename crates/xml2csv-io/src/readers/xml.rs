//! Forward-only XML token stream over any `BufRead`.
//!
//! Wraps `quick_xml::Reader` and reduces its event set to the three tokens the
//! converter cares about: start tags (by local name), end tags, and character
//! data with references already resolved. The stream is lazy, finite and not
//! restartable; it is fused after the first error or the end of input.

use std::io::{self, BufRead};
use std::sync::Arc;

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::Event;
use quick_xml::Reader;
use xml2csv_core::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlToken {
    /// Start tag; namespace prefixes are stripped from the name.
    Start { local_name: String },
    End,
    /// Character data, including CDATA sections and resolved references.
    Text(String),
}

pub struct XmlTokens<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    finished: bool,
}

impl<R: BufRead> XmlTokens<R> {
    pub fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        let config = reader.config_mut();
        // <a/> must look exactly like <a></a> to the depth counter.
        config.expand_empty_elements = true;
        config.check_end_names = true;
        // Whitespace is trimmed per column by the converter, not here.
        config.trim_text(false);
        Self {
            reader,
            buf: Vec::new(),
            depth: 0,
            finished: false,
        }
    }

    /// Byte offset of the reader within the input.
    pub fn byte_position(&self) -> u64 {
        self.reader.buffer_position()
    }

    fn next_token(&mut self) -> Result<Option<XmlToken>> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => return Err(map_xml_error(e, self.reader.error_position())),
            };
            let position = self.reader.buffer_position();

            match event {
                Event::Start(e) => {
                    let local_name = std::str::from_utf8(e.local_name().as_ref())
                        .map_err(|err| Error::malformed(position, format!("element name: {err}")))?
                        .to_string();
                    self.depth += 1;
                    return Ok(Some(XmlToken::Start { local_name }));
                }
                Event::End(_) => {
                    if self.depth == 0 {
                        return Err(Error::malformed(position, "end tag without a start tag"));
                    }
                    self.depth -= 1;
                    return Ok(Some(XmlToken::End));
                }
                Event::Text(e) => {
                    let text = e
                        .decode()
                        .map_err(|err| Error::malformed(position, err.to_string()))?;
                    return Ok(Some(XmlToken::Text(text.into_owned())));
                }
                Event::CData(e) => {
                    let text = std::str::from_utf8(&e)
                        .map_err(|err| Error::malformed(position, format!("CDATA: {err}")))?;
                    return Ok(Some(XmlToken::Text(text.to_string())));
                }
                Event::GeneralRef(e) => {
                    let raw = e
                        .decode()
                        .map_err(|err| Error::malformed(position, err.to_string()))?;
                    let text = resolve_reference(&raw).ok_or_else(|| {
                        Error::malformed(position, format!("unknown entity reference &{raw};"))
                    })?;
                    return Ok(Some(XmlToken::Text(text)));
                }
                Event::Eof => {
                    if self.depth > 0 {
                        return Err(Error::UnexpectedEof {
                            position,
                            open_elements: self.depth,
                        });
                    }
                    return Ok(None);
                }
                // Expanded by config; kept for completeness.
                Event::Empty(_) => {
                    return Err(Error::malformed(position, "unexpanded empty element"));
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => continue,
            }
        }
    }
}

impl<R: BufRead> Iterator for XmlTokens<R> {
    type Item = Result<XmlToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Resolve a predefined (`lt`) or numeric (`#10`, `#x0A`) reference.
fn resolve_reference(raw: &str) -> Option<String> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Some(resolved.to_string());
    }
    let rest = raw.strip_prefix('#')?;
    let code = match rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => rest.parse::<u32>().ok()?,
    };
    char::from_u32(code).map(String::from)
}

fn map_xml_error(err: quick_xml::Error, position: u64) -> Error {
    match err {
        quick_xml::Error::Io(shared) => Error::Io(
            Arc::try_unwrap(shared)
                .unwrap_or_else(|shared| io::Error::new(shared.kind(), shared.to_string())),
        ),
        other => Error::malformed(position, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(xml: &str) -> Result<Vec<XmlToken>> {
        XmlTokens::new(xml.as_bytes()).collect()
    }

    fn start(name: &str) -> XmlToken {
        XmlToken::Start {
            local_name: name.to_string(),
        }
    }

    fn text(s: &str) -> XmlToken {
        XmlToken::Text(s.to_string())
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(tokens("").unwrap().is_empty());
    }

    #[test]
    fn declaration_and_comments_are_skipped() {
        let got = tokens(r#"<?xml version="1.0"?><!-- hi --><root>x</root>"#).unwrap();
        assert_eq!(got, vec![start("root"), text("x"), XmlToken::End]);
    }

    #[test]
    fn empty_element_expands() {
        let got = tokens("<a/>").unwrap();
        assert_eq!(got, vec![start("a"), XmlToken::End]);
    }

    #[test]
    fn prefix_is_stripped() {
        let got = tokens(r#"<g:item xmlns:g="urn:g"></g:item>"#).unwrap();
        assert_eq!(got, vec![start("item"), XmlToken::End]);
    }

    #[test]
    fn references_and_cdata_become_text() {
        let got = tokens("<a>x &amp; y&#33;<![CDATA[<raw>]]></a>").unwrap();
        let joined: String = got
            .iter()
            .filter_map(|t| match t {
                XmlToken::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(joined, "x & y!<raw>");
    }

    #[test]
    fn unknown_entity_is_malformed() {
        let err = tokens("<a>&bogus;</a>").unwrap_err();
        assert!(err.is_malformed(), "{err}");
    }

    #[test]
    fn mismatched_end_tag_is_malformed() {
        let err = tokens("<a><b></a></b>").unwrap_err();
        assert!(err.is_malformed(), "{err}");
    }

    #[test]
    fn truncated_document_is_malformed() {
        let err = tokens("<root><item><a>1</a>").unwrap_err();
        assert!(err.is_malformed(), "{err}");
    }

    #[test]
    fn stream_is_fused_after_error() {
        let mut it = XmlTokens::new("<a></b>".as_bytes());
        assert!(matches!(it.next(), Some(Ok(XmlToken::Start { .. }))));
        assert!(matches!(it.next(), Some(Err(_))));
        assert!(it.next().is_none());
    }

    #[test]
    fn resolves_numeric_references() {
        assert_eq!(resolve_reference("#10").as_deref(), Some("\n"));
        assert_eq!(resolve_reference("#x41").as_deref(), Some("A"));
        assert_eq!(resolve_reference("quot").as_deref(), Some("\""));
        assert_eq!(resolve_reference("nope"), None);
        assert_eq!(resolve_reference("#xZZ"), None);
    }
}

//! Small helpers over quick-xml events shared by both XML parsers.

use quick_xml::Decoder;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart};

/// Reads the named attributes of `element` in a single pass.
///
/// Slot `i` of the result holds the unescaped value of `names[i]`, or `None`
/// when the attribute is absent. Prefixed attribute names never match.
pub(crate) fn read_attributes<const N: usize>(
    element: &BytesStart<'_>,
    names: [&[u8]; N],
    decoder: Decoder,
) -> std::result::Result<[Option<String>; N], quick_xml::Error> {
    let mut values: [Option<String>; N] = std::array::from_fn(|_| None);
    for attribute in element.attributes() {
        let attribute = attribute?;
        let key = attribute.key.as_ref();
        if let Some(slot) = names.iter().position(|name| *name == key)
            && values[slot].is_none()
        {
            values[slot] = Some(
                attribute
                    .decode_and_unescape_value(decoder)?
                    .into_owned(),
            );
        }
    }
    Ok(values)
}

/// Resolves a character reference or one of the predefined entities.
///
/// Returns `None` for any other entity name; a document that uses one
/// without declaring it is not well-formed.
pub(crate) fn resolve_reference(
    reference: &BytesRef<'_>,
) -> std::result::Result<Option<String>, quick_xml::Error> {
    if let Some(ch) = reference.resolve_char_ref()? {
        return Ok(Some(ch.to_string()));
    }
    let name = reference.decode()?;
    Ok(resolve_predefined_entity(&name).map(str::to_string))
}

/// Checks every attribute of `element` for well-formedness.
///
/// Unquoted or valueless attributes, duplicates, and values containing
/// unknown entities are all reported as errors.
pub(crate) fn check_attributes(
    element: &BytesStart<'_>,
    decoder: Decoder,
) -> std::result::Result<(), quick_xml::Error> {
    for attribute in element.attributes() {
        attribute?.decode_and_unescape_value(decoder)?;
    }
    Ok(())
}

/// True for errors caused by malformed markup rather than failed reads.
pub(crate) fn is_syntax_error(error: &quick_xml::Error) -> bool {
    !matches!(error, quick_xml::Error::Io(_))
}

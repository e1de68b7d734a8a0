//! PEM <-> DER transcoding and splitting of concatenated PEM objects.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{PkiError, Result};

pub(crate) const BEGIN_MARKER: &str = "-----BEGIN";
const END_MARKER: &str = "-----END";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
///
/// The body is wrapped at 64 characters and the footer is followed by a newline.
pub fn encode_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a single PEM‑encoded object to DER‑encoded bytes.
///
/// Everything between the end of the header line and the start of the last
/// footer marker is base64-decoded. Text carrying more than one `BEGIN`
/// marker is rejected; use [`split_pem_objects`] for bundles.
pub fn decode_pem(text: &str) -> Result<Vec<u8>> {
    let text = text.replace('\r', "");
    let begin = text
        .find(BEGIN_MARKER)
        .ok_or_else(|| PkiError::FormatError("missing BEGIN marker".to_string()))?;
    if text[begin + BEGIN_MARKER.len()..].contains(BEGIN_MARKER) {
        return Err(PkiError::FormatError(
            "expected a single PEM-encoded object".to_string(),
        ));
    }

    let body_start = text[begin..]
        .find("-----\n")
        .map(|idx| begin + idx + "-----\n".len())
        .ok_or_else(|| PkiError::FormatError("unterminated PEM header".to_string()))?;
    let body_end = text
        .rfind(END_MARKER)
        .filter(|&idx| idx >= body_start)
        .ok_or_else(|| PkiError::FormatError("missing END marker".to_string()))?;

    let body: String = text[body_start..body_end]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(body)
        .map_err(|e| PkiError::FormatError(e.to_string()))
}

/// Split concatenated PEM objects into one string per object.
///
/// Each returned block runs from its `BEGIN` marker through the newline that
/// ends its `END` line (or the end of input). Text before, between or after
/// blocks is dropped. Empty input yields no objects.
pub fn split_pem_objects(text: &str) -> Result<Vec<String>> {
    let mut objects = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(BEGIN_MARKER) {
        let end_marker = rest[start..]
            .find(END_MARKER)
            .map(|idx| start + idx)
            .ok_or_else(|| {
                PkiError::FormatError("invalid PEM object (missing END tag)".to_string())
            })?;
        let end = rest[end_marker..]
            .find('\n')
            .map(|idx| end_marker + idx + 1)
            .unwrap_or(rest.len());

        objects.push(rest[start..end].to_string());
        rest = &rest[end..];
    }

    Ok(objects)
}

/// True when the bytes contain a PEM `BEGIN` marker anywhere.
pub(crate) fn contains_pem_marker(raw: &[u8]) -> bool {
    raw.windows(BEGIN_MARKER.len())
        .any(|window| window == BEGIN_MARKER.as_bytes())
}

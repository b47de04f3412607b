//! Export-data payload shared by the importer and the object writer (§4.3).
//!
//! A compiled package's visible declarations are serialized to this `serde`
//! record rather than a hand-rolled binary encoder. Text export (`$$\n`) is
//! JSON; binary export (`$$B\n`) writes the same JSON body verbatim — a
//! parseable, round-trippable shape is all that's required, not a distinct
//! byte encoding for the "binary" variant.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportedType {
    pub name: String,
    pub underlying: String,
    pub methods: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportedFunc {
    pub name: String,
    pub signature: String,
    pub inline_body: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportedConst {
    pub name: String,
    pub ty: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportedVar {
    pub name: String,
    pub ty: String,
}

/// Everything a package exposes to importers (§4.3 Post-conditions: "all
/// declarations defined by the imported package are installed").
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ExportData {
    pub import_path: String,
    pub safe: bool,
    pub types: Vec<ExportedType>,
    pub funcs: Vec<ExportedFunc>,
    pub consts: Vec<ExportedConst>,
    pub vars: Vec<ExportedVar>,
}

/// Which `$$`/`$$B` framing variant a body was read from or should be
/// written as (§9 Open Question: reader accepts both, writer emits binary
/// only).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExportFormat {
    Text,
    Binary,
}

#[derive(Debug)]
pub struct ExportCodecError(pub String);

impl std::fmt::Display for ExportCodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "export data codec error: {}", self.0)
    }
}

impl std::error::Error for ExportCodecError {}

/// Serializes `data` per `format`. Both variants use the same JSON body;
/// the distinction only matters for the framing bytes the importer/writer
/// wrap around it (see `importer::mod` and `objfile`).
pub fn encode(data: &ExportData, format: ExportFormat) -> Result<Vec<u8>, ExportCodecError> {
    match format {
        ExportFormat::Text | ExportFormat::Binary => {
            serde_json::to_vec(data).map_err(|e| ExportCodecError(e.to_string()))
        }
    }
}

pub fn decode(bytes: &[u8]) -> Result<ExportData, ExportCodecError> {
    serde_json::from_slice(bytes).map_err(|e| ExportCodecError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExportData {
        ExportData {
            import_path: "encoding/base64".to_string(),
            safe: true,
            types: vec![ExportedType {
                name: "Encoding".to_string(),
                underlying: "struct{...}".to_string(),
                methods: vec!["EncodeToString".to_string()],
            }],
            funcs: vec![ExportedFunc {
                name: "NewEncoding".to_string(),
                signature: "func(string) *Encoding".to_string(),
                inline_body: None,
            }],
            consts: vec![],
            vars: vec![],
        }
    }

    #[test]
    fn round_trips_through_text_format() {
        let data = sample();
        let bytes = encode(&data, ExportFormat::Text).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!(data, back);
    }

    #[test]
    fn round_trips_through_binary_format() {
        let data = sample();
        let bytes = encode(&data, ExportFormat::Binary).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!(data, back);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"not json at all").is_err());
    }
}

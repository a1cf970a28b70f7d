//! Source Map v3 generation.
//!
//! Mappings are recorded with 0-indexed generated and original positions and
//! serialized as base64 VLQ segments. The printer decides *when* a mapping is
//! added; this module only encodes them.

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Base64 VLQ encoding as used by the `mappings` field.
pub mod vlq {
    const BASE64_CHARS: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    const VLQ_BASE_SHIFT: u32 = 5;
    const VLQ_BASE: i64 = 1 << VLQ_BASE_SHIFT;
    const VLQ_BASE_MASK: i64 = VLQ_BASE - 1;
    const VLQ_CONTINUATION_BIT: i64 = VLQ_BASE;

    pub fn encode(value: i32) -> String {
        let mut out = String::new();
        encode_into(&mut out, value);
        out
    }

    pub fn encode_into(out: &mut String, value: i32) {
        let value = value as i64;
        // Sign goes into the least significant bit
        let mut vlq = if value < 0 { ((-value) << 1) | 1 } else { value << 1 };
        loop {
            let mut digit = vlq & VLQ_BASE_MASK;
            vlq >>= VLQ_BASE_SHIFT;
            if vlq > 0 {
                digit |= VLQ_CONTINUATION_BIT;
            }
            out.push(BASE64_CHARS[digit as usize] as char);
            if vlq == 0 {
                break;
            }
        }
    }

    fn base64_value(byte: u8) -> Option<i64> {
        let value = match byte {
            b'A'..=b'Z' => byte - b'A',
            b'a'..=b'z' => byte - b'a' + 26,
            b'0'..=b'9' => byte - b'0' + 52,
            b'+' => 62,
            b'/' => 63,
            _ => return None,
        };
        Some(value as i64)
    }

    /// Decode one value, returning it and the number of bytes consumed.
    pub fn decode(input: &str) -> Option<(i32, usize)> {
        let mut result: i64 = 0;
        let mut shift = 0u32;
        for (i, byte) in input.bytes().enumerate() {
            let digit = base64_value(byte)?;
            result += (digit & VLQ_BASE_MASK) << shift;
            if digit & VLQ_CONTINUATION_BIT == 0 {
                let negative = result & 1 == 1;
                let magnitude = result >> 1;
                let value = if negative { -magnitude } else { magnitude };
                return Some((value as i32, i + 1));
            }
            shift += VLQ_BASE_SHIFT;
            if shift > 32 {
                return None;
            }
        }
        None
    }
}

const BASE64_TABLE: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Standard (padded) base64, used for inline source map data URLs.
pub fn base64_encode(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);
    for chunk in input.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;

        out.push(BASE64_TABLE[((triple >> 18) & 0x3F) as usize] as char);
        out.push(BASE64_TABLE[((triple >> 12) & 0x3F) as usize] as char);
        if chunk.len() > 1 {
            out.push(BASE64_TABLE[((triple >> 6) & 0x3F) as usize] as char);
        } else {
            out.push('=');
        }
        if chunk.len() > 2 {
            out.push(BASE64_TABLE[(triple & 0x3F) as usize] as char);
        } else {
            out.push('=');
        }
    }
    out
}

/// A single mapping from a generated position to an original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source_index: u32,
    pub original_line: u32,
    pub original_column: u32,
    pub name_index: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap<'a> {
    version: u32,
    file: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    source_root: &'a str,
    sources: &'a [String],
    names: &'a [String],
    mappings: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources_content: Option<&'a [Option<String>]>,
}

/// Decode a `mappings` string back into absolute mappings.
///
/// Segments with only a generated column (no source) are skipped. Returns
/// `None` on malformed input.
pub fn decode_mappings(mappings: &str) -> Option<Vec<Mapping>> {
    let mut decoded = Vec::new();
    let mut prev_source = 0i32;
    let mut prev_original_line = 0i32;
    let mut prev_original_column = 0i32;
    let mut prev_name = 0i32;

    for (generated_line, line) in mappings.split(';').enumerate() {
        let mut prev_generated_column = 0i32;
        for segment in line.split(',').filter(|s| !s.is_empty()) {
            let mut fields = [0i32; 5];
            let mut count = 0;
            let mut rest = segment;
            while !rest.is_empty() {
                if count == fields.len() {
                    return None;
                }
                let (value, consumed) = vlq::decode(rest)?;
                fields[count] = value;
                count += 1;
                rest = &rest[consumed..];
            }

            prev_generated_column += fields[0];
            if count < 4 {
                continue;
            }
            prev_source += fields[1];
            prev_original_line += fields[2];
            prev_original_column += fields[3];
            let name_index = if count == 5 {
                prev_name += fields[4];
                Some(prev_name as u32)
            } else {
                None
            };

            decoded.push(Mapping {
                generated_line: generated_line as u32,
                generated_column: prev_generated_column as u32,
                source_index: prev_source as u32,
                original_line: prev_original_line as u32,
                original_column: prev_original_column as u32,
                name_index,
            });
        }
    }
    Some(decoded)
}

/// Source map builder.
#[derive(Debug, Clone, Default)]
pub struct SourceMapGenerator {
    file: String,
    source_root: String,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    source_indices: FxHashMap<String, u32>,
    names: Vec<String>,
    name_indices: FxHashMap<String, u32>,
    mappings: Vec<Mapping>,
}

impl SourceMapGenerator {
    pub fn new(file: String) -> Self {
        SourceMapGenerator {
            file,
            ..Default::default()
        }
    }

    pub fn set_source_root(&mut self, root: impl Into<String>) {
        self.source_root = root.into();
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Register a source file, returning its index. Re-adding returns the same index.
    pub fn add_source(&mut self, source: String) -> u32 {
        if let Some(&index) = self.source_indices.get(&source) {
            return index;
        }
        let index = self.sources.len() as u32;
        self.source_indices.insert(source.clone(), index);
        self.sources.push(source);
        self.sources_content.push(None);
        index
    }

    pub fn add_source_with_content(&mut self, source: String, content: String) -> u32 {
        let index = self.add_source(source);
        self.sources_content[index as usize] = Some(content);
        index
    }

    pub fn add_name(&mut self, name: String) -> u32 {
        if let Some(&index) = self.name_indices.get(&name) {
            return index;
        }
        let index = self.names.len() as u32;
        self.name_indices.insert(name.clone(), index);
        self.names.push(name);
        index
    }

    pub fn add_mapping(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }

    pub fn add_simple_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
    ) {
        self.add_mapping(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
            name_index: None,
        });
    }

    pub fn add_named_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
        name_index: u32,
    ) {
        self.add_mapping(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
            name_index: Some(name_index),
        });
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Encode all mappings into the VLQ `mappings` string.
    pub fn encode_mappings(&self) -> String {
        let mut sorted = self.mappings.clone();
        sorted.sort_by_key(|m| (m.generated_line, m.generated_column));

        let mut out = String::new();
        let mut current_line = 0u32;
        let mut prev_generated_column = 0i32;
        let mut prev_source = 0i32;
        let mut prev_original_line = 0i32;
        let mut prev_original_column = 0i32;
        let mut prev_name = 0i32;
        let mut first_in_line = true;

        for mapping in &sorted {
            while current_line < mapping.generated_line {
                out.push(';');
                current_line += 1;
                prev_generated_column = 0;
                first_in_line = true;
            }
            if !first_in_line {
                out.push(',');
            }
            first_in_line = false;

            vlq::encode_into(&mut out, mapping.generated_column as i32 - prev_generated_column);
            prev_generated_column = mapping.generated_column as i32;

            vlq::encode_into(&mut out, mapping.source_index as i32 - prev_source);
            prev_source = mapping.source_index as i32;

            vlq::encode_into(&mut out, mapping.original_line as i32 - prev_original_line);
            prev_original_line = mapping.original_line as i32;

            vlq::encode_into(&mut out, mapping.original_column as i32 - prev_original_column);
            prev_original_column = mapping.original_column as i32;

            if let Some(name) = mapping.name_index {
                vlq::encode_into(&mut out, name as i32 - prev_name);
                prev_name = name as i32;
            }
        }
        out
    }

    /// Serialize as a v3 source map.
    pub fn to_json(&self) -> String {
        let has_content = self.sources_content.iter().any(Option::is_some);
        let raw = RawSourceMap {
            version: 3,
            file: &self.file,
            source_root: &self.source_root,
            sources: &self.sources,
            names: &self.names,
            mappings: self.encode_mappings(),
            sources_content: has_content.then_some(self.sources_content.as_slice()),
        };
        serde_json::to_string(&raw).unwrap_or_default()
    }

    /// Lua comment embedding the map as a base64 data URL.
    pub fn to_inline_comment(&self) -> String {
        format!(
            "--# sourceMappingURL=data:application/json;base64,{}\n",
            base64_encode(self.to_json().as_bytes())
        )
    }
}

#[cfg(test)]
#[path = "../tests/source_map.rs"]
mod tests;

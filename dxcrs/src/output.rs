//! Compiler output kinds and owned output buffers

use bitflags::bitflags;
use dxcompiler::{
    DXC_CP_ACP, DXC_CP_UTF8, DXC_CP_UTF16, DXC_CP_UTF32, DXC_OUT_DISASSEMBLY, DXC_OUT_ERRORS,
    DXC_OUT_EXTRA_OUTPUTS, DXC_OUT_HLSL, DXC_OUT_KIND, DXC_OUT_OBJECT, DXC_OUT_PDB,
    DXC_OUT_REFLECTION, DXC_OUT_REMARKS, DXC_OUT_ROOT_SIGNATURE, DXC_OUT_SHADER_HASH,
    DXC_OUT_TEXT, DXC_OUT_TIME_REPORT, DXC_OUT_TIME_TRACE,
};

/// A kind of output a compile can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutKind {
    /// Compiled object (DXIL container or SPIR-V)
    Object,
    /// Errors and warnings
    Errors,
    /// Debug database
    Pdb,
    /// Shader hash
    ShaderHash,
    /// Disassembly listing
    Disassembly,
    /// Preprocessed or rewritten HLSL
    Hlsl,
    /// Text output, e.g. `-P` preprocessing
    Text,
    /// Reflection data
    Reflection,
    /// Serialized root signature
    RootSignature,
    /// Additional outputs
    ExtraOutputs,
    /// Optimization remarks
    Remarks,
    /// `-ftime-report` output
    TimeReport,
    /// `-ftime-trace` output
    TimeTrace,
}

impl OutKind {
    /// Every kind, in native order
    pub const ALL: [OutKind; 13] = [
        OutKind::Object,
        OutKind::Errors,
        OutKind::Pdb,
        OutKind::ShaderHash,
        OutKind::Disassembly,
        OutKind::Hlsl,
        OutKind::Text,
        OutKind::Reflection,
        OutKind::RootSignature,
        OutKind::ExtraOutputs,
        OutKind::Remarks,
        OutKind::TimeReport,
        OutKind::TimeTrace,
    ];

    /// Native `DXC_OUT_KIND` value
    pub fn to_raw(self) -> DXC_OUT_KIND {
        match self {
            OutKind::Object => DXC_OUT_OBJECT,
            OutKind::Errors => DXC_OUT_ERRORS,
            OutKind::Pdb => DXC_OUT_PDB,
            OutKind::ShaderHash => DXC_OUT_SHADER_HASH,
            OutKind::Disassembly => DXC_OUT_DISASSEMBLY,
            OutKind::Hlsl => DXC_OUT_HLSL,
            OutKind::Text => DXC_OUT_TEXT,
            OutKind::Reflection => DXC_OUT_REFLECTION,
            OutKind::RootSignature => DXC_OUT_ROOT_SIGNATURE,
            OutKind::ExtraOutputs => DXC_OUT_EXTRA_OUTPUTS,
            OutKind::Remarks => DXC_OUT_REMARKS,
            OutKind::TimeReport => DXC_OUT_TIME_REPORT,
            OutKind::TimeTrace => DXC_OUT_TIME_TRACE,
        }
    }

    /// Bit for this kind in [`OutputKinds`]
    pub fn flag(self) -> OutputKinds {
        OutputKinds::from_bits_retain(1 << self.to_raw())
    }
}

bitflags! {
    /// Set of output kinds to collect after a compile
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutputKinds: u32 {
        const OBJECT = 1 << DXC_OUT_OBJECT;
        const ERRORS = 1 << DXC_OUT_ERRORS;
        const PDB = 1 << DXC_OUT_PDB;
        const SHADER_HASH = 1 << DXC_OUT_SHADER_HASH;
        const DISASSEMBLY = 1 << DXC_OUT_DISASSEMBLY;
        const HLSL = 1 << DXC_OUT_HLSL;
        const TEXT = 1 << DXC_OUT_TEXT;
        const REFLECTION = 1 << DXC_OUT_REFLECTION;
        const ROOT_SIGNATURE = 1 << DXC_OUT_ROOT_SIGNATURE;
        const EXTRA_OUTPUTS = 1 << DXC_OUT_EXTRA_OUTPUTS;
        const REMARKS = 1 << DXC_OUT_REMARKS;
        const TIME_REPORT = 1 << DXC_OUT_TIME_REPORT;
        const TIME_TRACE = 1 << DXC_OUT_TIME_TRACE;
    }
}

impl OutputKinds {
    /// The kinds contained in the set, in native order
    pub fn kinds(self) -> impl Iterator<Item = OutKind> {
        OutKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(kind.flag()))
    }
}

/// Text encoding reported for an output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Binary data, or text in the compiler's default code page (UTF-8)
    Unknown,
    Utf8,
    Utf16,
    Utf32,
    /// Any other code page
    Other(u32),
}

impl From<u32> for Encoding {
    fn from(codepage: u32) -> Self {
        match codepage {
            DXC_CP_ACP => Encoding::Unknown,
            DXC_CP_UTF8 => Encoding::Utf8,
            DXC_CP_UTF16 => Encoding::Utf16,
            DXC_CP_UTF32 => Encoding::Utf32,
            other => Encoding::Other(other),
        }
    }
}

/// One output copied out of a compile result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Raw output bytes
    pub data: Vec<u8>,
    /// Output name, e.g. the `-Fo` file name, if the compiler set one
    pub name: Option<String>,
    /// Encoding of `data`
    pub encoding: Encoding,
}

impl Output {
    /// Decodes the data as text.
    ///
    /// Trailing NUL characters are trimmed and malformed sequences are
    /// replaced, so this never fails.
    pub fn text(&self) -> String {
        decode_text(&self.data, self.encoding)
    }

    /// Returns the size of the data in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the output holds no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for Output {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Decodes text in the given encoding, trimming trailing NULs.
pub(crate) fn decode_text(data: &[u8], encoding: Encoding) -> String {
    let text = match encoding {
        Encoding::Utf16 => {
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        Encoding::Utf32 => data
            .chunks_exact(4)
            .map(|quad| {
                char::from_u32(u32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]))
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            })
            .collect(),
        Encoding::Other(codepage) => {
            log::warn!("Decoding code page {} output as UTF-8", codepage);
            String::from_utf8_lossy(data).into_owned()
        }
        Encoding::Unknown | Encoding::Utf8 => String::from_utf8_lossy(data).into_owned(),
    };

    text.trim_end_matches('\0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_flags_match_constants() {
        assert_eq!(OutKind::Object.flag(), OutputKinds::OBJECT);
        assert_eq!(OutKind::TimeTrace.flag(), OutputKinds::TIME_TRACE);
        for kind in OutKind::ALL {
            assert_eq!(kind.flag().bits().count_ones(), 1);
        }
    }

    #[test]
    fn test_kinds_iteration() {
        let kinds: Vec<_> = (OutputKinds::REFLECTION | OutputKinds::ERRORS).kinds().collect();
        assert_eq!(kinds, vec![OutKind::Errors, OutKind::Reflection]);
        assert_eq!(OutputKinds::all().kinds().count(), 13);
    }

    #[test]
    fn test_decode_utf8_trims_nul() {
        assert_eq!(decode_text(b"warning\0\0", Encoding::Utf8), "warning");
        assert_eq!(decode_text(b"", Encoding::Unknown), "");
    }

    #[test]
    fn test_decode_utf16() {
        let data: Vec<u8> = "hi\0"
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        assert_eq!(decode_text(&data, Encoding::Utf16), "hi");
    }

    #[test]
    fn test_decode_utf32() {
        let data: Vec<u8> = "ok".chars().flat_map(|c| (c as u32).to_le_bytes()).collect();
        assert_eq!(decode_text(&data, Encoding::Utf32), "ok");
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let text = decode_text(&[b'a', 0xff, b'b'], Encoding::Utf8);
        assert_eq!(text, "a\u{fffd}b");
    }

    #[test]
    fn test_encoding_from_codepage() {
        assert_eq!(Encoding::from(65001), Encoding::Utf8);
        assert_eq!(Encoding::from(1200), Encoding::Utf16);
        assert_eq!(Encoding::from(437), Encoding::Other(437));
    }
}

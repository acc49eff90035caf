//! Declarative mapping from settings to command-line flags
//!
//! The argument builder walks [`OPTION_TABLE`] in order, so the order of
//! the entries is the order of the emitted arguments.

use super::{DebugInfo, FlowControlMode, MatrixPackMode, OptimizationLevel, Setting};

/// How a setting turns into flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean; emits the flag only when true
    Flag,
    /// Boolean with a flag for each state (`-fx` / `-fno-x`)
    PairedSwitch,
    /// Free text
    ScalarString,
    /// One flag per variant, or the variant symbol as a value
    Enum,
    /// Integer rendered in decimal
    Numeric,
}

/// How a value attaches to its flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Flag and value as two arguments: `-E main`
    Spaced,
    /// One argument joined with `=`: `-fspv-target-env=vulkan1.2`
    Equals,
    /// The flag alone; the value is dropped
    FlagOnly,
}

/// Describes how one setting is serialized
#[derive(Debug, Clone, Copy)]
pub struct OptionDef {
    /// The setting this entry serializes
    pub setting: Setting,
    /// Primary flag name
    pub name: &'static str,
    pub kind: OptionKind,
    pub assignment: Assignment,
    /// `(value, flag)` pairs for switches and enums with per-variant flags
    pub values: &'static [(i32, &'static str)],
}

impl OptionDef {
    /// A boolean flag
    pub const fn flag(setting: Setting, name: &'static str) -> Self {
        OptionDef {
            setting,
            name,
            kind: OptionKind::Flag,
            assignment: Assignment::FlagOnly,
            values: &[],
        }
    }

    /// A boolean with one flag for true (1) and one for false (0)
    pub const fn switch(setting: Setting, values: &'static [(i32, &'static str)]) -> Self {
        OptionDef {
            setting,
            name: values[0].1,
            kind: OptionKind::PairedSwitch,
            assignment: Assignment::FlagOnly,
            values,
        }
    }

    /// An enum with a flag per variant discriminant
    pub const fn choices(setting: Setting, values: &'static [(i32, &'static str)]) -> Self {
        OptionDef {
            setting,
            name: values[0].1,
            kind: OptionKind::Enum,
            assignment: Assignment::FlagOnly,
            values,
        }
    }

    /// An enum passed by its symbol as the flag's value
    pub const fn symbolic(setting: Setting, name: &'static str) -> Self {
        OptionDef {
            setting,
            name,
            kind: OptionKind::Enum,
            assignment: Assignment::Spaced,
            values: &[],
        }
    }

    /// A free text option
    pub const fn string(setting: Setting, name: &'static str, assignment: Assignment) -> Self {
        OptionDef {
            setting,
            name,
            kind: OptionKind::ScalarString,
            assignment,
            values: &[],
        }
    }

    /// An integer option
    pub const fn numeric(setting: Setting, name: &'static str) -> Self {
        OptionDef {
            setting,
            name,
            kind: OptionKind::Numeric,
            assignment: Assignment::Spaced,
            values: &[],
        }
    }

    /// Returns the flag registered for `value`, if any
    pub fn flag_for(&self, value: i32) -> Option<&'static str> {
        self.values
            .iter()
            .find(|(candidate, _)| *candidate == value)
            .map(|(_, flag)| *flag)
    }

    /// Returns true if the enum is serialized through its symbol
    pub fn is_symbolic(&self) -> bool {
        self.values.len() <= 1
    }
}

const DIAGNOSTICS_SHOW_OPTION: &[(i32, &str)] = &[
    (1, "-fdiagnostics-show-option"),
    (0, "-fno-diagnostics-show-option"),
];

const FLOW_CONTROL: &[(i32, &str)] = &[
    (FlowControlMode::Avoid as i32, "-Gfa"),
    (FlowControlMode::Prefer as i32, "-Gfp"),
];

const DEBUG_INFO: &[(i32, &str)] = &[
    (DebugInfo::Normal as i32, "-Zi"),
    (DebugInfo::Slim as i32, "-Zs"),
];

const MATRIX_PACKING: &[(i32, &str)] = &[
    (MatrixPackMode::ColumnMajor as i32, "-Zpc"),
    (MatrixPackMode::RowMajor as i32, "-Zpr"),
];

const FINITE_MATH_ONLY: &[(i32, &str)] = &[
    (1, "-ffinite-math-only"),
    (0, "-fno-finite-math-only"),
];

const OPTIMIZATION: &[(i32, &str)] = &[
    (OptimizationLevel::O0 as i32, "-O0"),
    (OptimizationLevel::O1 as i32, "-O1"),
    (OptimizationLevel::O2 as i32, "-O2"),
    (OptimizationLevel::O3 as i32, "-O3"),
];

use Assignment::{Equals, Spaced};
use OptionDef as D;
use Setting as S;

/// The mandatory `-T <profile>` pair
pub const PROFILE_OPTION: OptionDef = D::string(S::Profile, "-T", Spaced);

/// Every option the compiler understands, in emission order
pub static OPTION_TABLE: &[OptionDef] = &[
    // Target
    D::string(S::EntryPoint, "-E", Spaced),
    PROFILE_OPTION,
    // Compilation
    D::flag(S::AllResourcesBound, "-all-resources-bound"),
    D::numeric(S::AutoBindingSpace, "-auto-binding-space"),
    D::flag(S::ColorCodedListings, "-Cc"),
    D::symbolic(S::DefaultLinkage, "-default-linkage"),
    D::symbolic(S::DenormalMode, "-denorm"),
    D::flag(S::DisablePayloadQualifiers, "-disable-payload-qualifiers"),
    D::flag(S::Enable16BitTypes, "-enable-16bit-types"),
    D::flag(S::EnableLifetimeMarkers, "-enable-lifetime-markers"),
    D::flag(S::EnablePayloadQualifiers, "-enable-payload-qualifiers"),
    D::string(S::Encoding, "-encoding", Spaced),
    D::flag(S::ExportShadersOnly, "-export-shaders-only"),
    D::string(S::Exports, "-exports", Spaced),
    D::string(S::AssemblyListingFile, "-Fc", Spaced),
    D::switch(S::DiagnosticsShowOption, DIAGNOSTICS_SHOW_OPTION),
    D::flag(S::DisableLocTracking, "-fdisable-loc-tracking"),
    D::string(S::DebugOutputName, "-Fd", Spaced),
    D::string(S::ErrorOutputName, "-Fe", Spaced),
    D::string(S::HeaderOutputName, "-Fh", Spaced),
    D::string(S::PreprocessOutputName, "-Fi", Spaced),
    D::flag(S::LegacyMacroExpansion, "-flegacy-macro-expansion"),
    D::flag(S::LegacyResourceReservation, "-flegacy-resource-reservation"),
    D::flag(S::NewInliningBehavior, "-fnew-inlining-behavior"),
    D::string(S::RootSignatureVersion, "-force-rootsig-ver", Spaced),
    D::string(S::ObjectOutputName, "-Fo", Spaced),
    D::string(S::ReflectionOutputName, "-Fre", Spaced),
    D::string(S::RootSignatureOutputName, "-Frs", Spaced),
    D::string(S::HashOutputName, "-Fsh", Spaced),
    D::flag(S::TimeReport, "-ftime-report"),
    D::string(S::TimeTrace, "-ftime-trace", Equals),
    D::flag(S::BackwardCompatibilityMode, "-Gec"),
    D::flag(S::StrictMode, "-Ges"),
    D::choices(S::FlowControl, FLOW_CONTROL),
    D::flag(S::ForceIeeeStrictness, "-Gis"),
    D::symbolic(S::LanguageVersion, "-HV"),
    D::flag(S::ShowIncludes, "-H"),
    D::flag(S::IgnoreLineDirectives, "-ignore-line-directives"),
    D::flag(S::OutputHexLiterals, "-Lx"),
    D::flag(S::OutputInstructionNumbers, "-Ni"),
    D::flag(S::NoLegacyCbufferLayout, "-no-legacy-cbuf-layout"),
    D::flag(S::SuppressWarnings, "-no-warnings"),
    D::flag(S::OutputByteOffsets, "-No"),
    D::flag(S::PrintOptimizerCommands, "-Odump"),
    D::flag(S::DisableOptimization, "-Od"),
    D::flag(S::OptimizeSignaturePacking, "-pack-optimized"),
    D::flag(S::PackPrefixStable, "-pack-prefix-stable"),
    D::flag(S::Recompile, "-recompile"),
    D::flag(S::ResourcesMayAlias, "-res-may-alias"),
    D::string(S::RootSignatureDefine, "-rootsig-define", Spaced),
    D::flag(S::DisableValidation, "-Vd"),
    D::string(S::VerifyDirectives, "-verify", Spaced),
    D::flag(S::DisplayIncludeDetails, "-Vi"),
    D::string(S::VariableName, "-Vn", Spaced),
    D::flag(S::WarningsAsErrors, "-WX"),
    D::choices(S::DebugInfo, DEBUG_INFO),
    D::choices(S::MatrixPackMode, MATRIX_PACKING),
    D::flag(S::BinaryHash, "-Zsb"),
    D::flag(S::SourceHash, "-Zss"),
    // Optimization
    D::switch(S::FiniteMathOnly, FINITE_MATH_ONLY),
    D::choices(S::Optimization, OPTIMIZATION),
    // Rewriter
    D::flag(S::DeclareGlobalCbuffer, "-decl-global-cb"),
    D::flag(S::ExtractEntryUniforms, "-extract-entry-uniforms"),
    D::flag(S::GlobalExternByDefault, "-global-extern-by-default"),
    D::flag(S::KeepUserMacro, "-keep-user-macro"),
    D::flag(S::LineDirective, "-line-directive"),
    D::flag(S::RemoveUnusedFunctions, "-remove-unused-functions"),
    D::flag(S::RemoveUnusedGlobals, "-remove-unused-globals"),
    D::flag(S::SkipFunctionBody, "-skip-fn-body"),
    D::flag(S::SkipStatic, "-skip-static"),
    D::flag(S::RewriteUnchanged, "-unchanged"),
    // SPIR-V
    D::string(S::SpirvDebug, "-fspv-debug", Equals),
    D::string(S::SpirvEntryPointName, "-fspv-entrypoint-name", Equals),
    D::string(S::SpirvExtension, "-fspv-extension", Equals),
    D::flag(S::FlattenResourceArrays, "-fspv-flatten-resource-arrays"),
    D::flag(S::PreserveBindings, "-fspv-preserve-bindings"),
    D::flag(S::PreserveInterface, "-fspv-preserve-interface"),
    D::flag(S::SpirvPrintAll, "-fspv-print-all"),
    D::flag(S::ReduceLoadSize, "-fspv-reduce-load-size"),
    D::flag(S::SpirvReflect, "-fspv-reflect"),
    D::string(S::TargetEnvironment, "-fspv-target-env", Equals),
    D::flag(S::LegacyBufferMatrixOrder, "-fspv-use-legacy-buffer-matrix-order"),
    D::flag(S::AutoShiftBindings, "-fvk-auto-shift-bindings"),
    D::string(S::BRegisterShift, "-fvk-b-shift", Spaced),
    D::string(S::GlobalsBinding, "-fvk-bind-globals", Spaced),
    D::string(S::RegisterBinding, "-fvk-bind-register", Spaced),
    D::flag(S::InvertY, "-fvk-invert-y"),
    D::string(S::SRegisterShift, "-fvk-s-shift", Spaced),
    D::flag(S::NonzeroBaseInstance, "-fvk-support-nonzero-base-instance"),
    D::string(S::TRegisterShift, "-fvk-t-shift", Spaced),
    D::string(S::URegisterShift, "-fvk-u-shift", Spaced),
    D::flag(S::UseDxLayout, "-fvk-use-dx-layout"),
    D::flag(S::UseDxPositionW, "-fvk-use-dx-position-w"),
    D::flag(S::UseGlLayout, "-fvk-use-gl-layout"),
    D::flag(S::UseScalarLayout, "-fvk-use-scalar-layout"),
    D::string(S::SpirvOptimizerConfig, "-Oconfig", Equals),
    D::flag(S::GenerateAsSpirv, "-spirv"),
    // Utility
    D::flag(S::DumpBinary, "-dumpbin"),
    D::flag(S::ExtractRootSignature, "-extractrootsignature"),
    D::string(S::PrivateDataFile, "-getprivate", Spaced),
    D::string(S::LinkLibraries, "-link", Spaced),
    D::flag(S::PreprocessOnly, "-P"),
    D::flag(S::EmbedDebug, "-Qembed_debug"),
    D::flag(S::StripDebug, "-Qstrip_debug"),
    D::flag(S::StripPrivate, "-Qstrip_priv"),
    D::flag(S::StripReflection, "-Qstrip_reflect"),
    D::flag(S::StripRootSignature, "-Qstrip_rootsignature"),
    D::string(S::SetPrivateData, "-setprivate", Spaced),
    D::string(S::SetRootSignature, "-setrootsignature", Spaced),
    D::string(S::VerifyRootSignature, "-verifyrootsignature", Spaced),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_setting_mapped_once() {
        let mut seen = HashSet::new();
        for def in OPTION_TABLE {
            assert!(seen.insert(def.setting), "{:?} mapped twice", def.setting);
        }
        for setting in Setting::ALL {
            assert!(seen.contains(setting), "{setting:?} has no table entry");
        }
        assert_eq!(seen.len(), Setting::ALL.len());
    }

    #[test]
    fn test_flag_names_unique() {
        let mut names = HashSet::new();
        for def in OPTION_TABLE {
            if def.values.is_empty() {
                assert!(names.insert(def.name), "duplicate flag {}", def.name);
            }
            for (_, flag) in def.values {
                assert!(names.insert(*flag), "duplicate flag {flag}");
            }
        }
    }

    #[test]
    fn test_flag_for() {
        let optimization = OPTION_TABLE
            .iter()
            .find(|def| def.setting == Setting::Optimization)
            .unwrap();
        assert_eq!(optimization.flag_for(3), Some("-O3"));
        assert_eq!(optimization.flag_for(7), None);
        assert!(!optimization.is_symbolic());

        let denorm = OPTION_TABLE
            .iter()
            .find(|def| def.setting == Setting::DenormalMode)
            .unwrap();
        assert!(denorm.is_symbolic());
    }

    #[test]
    fn test_target_options_lead() {
        assert_eq!(OPTION_TABLE[0].name, "-E");
        assert_eq!(OPTION_TABLE[1].name, "-T");
    }
}

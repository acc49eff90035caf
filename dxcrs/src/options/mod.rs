//! Typed compiler configuration
//!
//! [`CompilerOptions`] holds one optional value per command-line option of
//! the compiler plus the open-ended macro and warning collections. Which
//! flag each value turns into is described separately by [`OPTION_TABLE`].

mod table;

pub use table::{Assignment, OPTION_TABLE, OptionDef, OptionKind, PROFILE_OPTION};

use crate::{Result, ShaderProfile};
use indexmap::IndexMap;
use std::borrow::Cow;

/// Value of a single option, as seen by the argument builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue<'a> {
    /// Boolean switch
    Bool(bool),
    /// Free text
    Text(Cow<'a, str>),
    /// Integer
    Number(i64),
    /// Enumerated value: its discriminant and symbolic name
    Choice {
        discriminant: i32,
        symbol: &'static str,
    },
}

/// Conversion of a configuration field into an [`OptionValue`]
pub trait OptionField {
    fn option_value(&self) -> OptionValue<'_>;
}

impl OptionField for bool {
    fn option_value(&self) -> OptionValue<'_> {
        OptionValue::Bool(*self)
    }
}

impl OptionField for String {
    fn option_value(&self) -> OptionValue<'_> {
        OptionValue::Text(Cow::Borrowed(self))
    }
}

impl OptionField for u32 {
    fn option_value(&self) -> OptionValue<'_> {
        OptionValue::Number(i64::from(*self))
    }
}

/// Declares a fieldless enum usable as an option value. Each variant
/// carries the symbolic name used when the option has no per-variant flag.
macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $symbol:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),*
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// Symbolic name of the variant
            pub fn symbol(self) -> &'static str {
                match self {
                    $( $name::$variant => $symbol ),*
                }
            }
        }

        impl OptionField for $name {
            fn option_value(&self) -> OptionValue<'_> {
                OptionValue::Choice {
                    discriminant: *self as i32,
                    symbol: self.symbol(),
                }
            }
        }
    };
}

option_enum! {
    /// Denormal handling for 32-bit floats (`-denorm`)
    pub enum DenormalMode {
        Any => "any",
        Preserve => "preserve",
        Ftz => "ftz",
    }
}

option_enum! {
    /// HLSL language version (`-HV`)
    pub enum LanguageVersion {
        V2016 => "_2016",
        V2017 => "_2017",
        V2018 => "_2018",
        V2021 => "_2021",
    }
}

option_enum! {
    /// Default linkage for non-shader functions in libraries (`-default-linkage`)
    pub enum Linkage {
        Internal => "internal",
        External => "external",
    }
}

option_enum! {
    /// Flow control preference (`-Gfa` / `-Gfp`)
    pub enum FlowControlMode {
        Avoid => "avoid",
        Prefer => "prefer",
    }
}

option_enum! {
    /// Debug information kind (`-Zi` / `-Zs`)
    pub enum DebugInfo {
        /// Full debug information
        Normal => "normal",
        /// Slim PDB
        Slim => "slim",
        /// Accepted for compatibility; has no command-line form and is never emitted
        Random => "random",
    }
}

option_enum! {
    /// Optimization level (`-O0` .. `-O3`)
    pub enum OptimizationLevel {
        O0 => "o0",
        O1 => "o1",
        O2 => "o2",
        O3 => "o3",
    }
}

option_enum! {
    /// Matrix packing order (`-Zpc` / `-Zpr`)
    pub enum MatrixPackMode {
        ColumnMajor => "column_major",
        RowMajor => "row_major",
    }
}

macro_rules! compiler_options {
    (
        $( $(#[$meta:meta])* $field:ident: $ty:ty => $setting:ident, )*
    ) => {
        /// Identifies one configurable setting of [`CompilerOptions`]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Setting {
            /// Target profile (`-T`), always present
            Profile,
            $( $(#[$meta])* $setting, )*
        }

        impl Setting {
            /// Every setting, in declaration order
            pub const ALL: &'static [Setting] = &[Setting::Profile, $(Setting::$setting,)*];
        }

        /// Compiler configuration.
        ///
        /// Every field is optional; `None` leaves the option off the command
        /// line entirely. The profile is mandatory and set at construction.
        #[derive(Debug, Clone, PartialEq)]
        pub struct CompilerOptions {
            profile: ShaderProfile,
            $( $(#[$meta])* pub $field: Option<$ty>, )*
            macros: IndexMap<String, String>,
            warnings: IndexMap<String, bool>,
        }

        impl CompilerOptions {
            /// Creates a configuration with every option unset.
            pub fn new(profile: ShaderProfile) -> Self {
                CompilerOptions {
                    profile,
                    $( $field: None, )*
                    macros: IndexMap::new(),
                    warnings: IndexMap::new(),
                }
            }

            /// Returns the configured value of a setting, or `None` if unset.
            pub fn value(&self, setting: Setting) -> Option<OptionValue<'_>> {
                match setting {
                    Setting::Profile => Some(OptionValue::Text(Cow::Owned(self.profile.to_string()))),
                    $( Setting::$setting => self.$field.as_ref().map(OptionField::option_value), )*
                }
            }
        }
    };
}

compiler_options! {
    // Target
    /// Entry point name (`-E`); the compiler assumes `main` when unset
    entry_point: String => EntryPoint,

    // Compilation
    /// Enables aggressive flattening (`-all-resources-bound`)
    all_resources_bound: bool => AllResourcesBound,
    /// Auto binding space for library resources (`-auto-binding-space`)
    auto_binding_space: u32 => AutoBindingSpace,
    /// Color-coded assembly listings (`-Cc`)
    color_coded_listings: bool => ColorCodedListings,
    /// Default linkage for non-shader library functions (`-default-linkage`)
    default_linkage: Linkage => DefaultLinkage,
    /// Denormal handling (`-denorm`)
    denormal_mode: DenormalMode => DenormalMode,
    /// Disables payload access qualifiers for SM 6.7 (`-disable-payload-qualifiers`)
    disable_payload_qualifiers: bool => DisablePayloadQualifiers,
    /// 16-bit types instead of min precision (`-enable-16bit-types`)
    enable_16bit_types: bool => Enable16BitTypes,
    /// Lifetime markers (`-enable-lifetime-markers`)
    enable_lifetime_markers: bool => EnableLifetimeMarkers,
    /// Payload access qualifiers for SM 6.6 (`-enable-payload-qualifiers`)
    enable_payload_qualifiers: bool => EnablePayloadQualifiers,
    /// Source and text output encoding (`-encoding`)
    encoding: String => Encoding,
    /// Only export shaders when compiling a library (`-export-shaders-only`)
    export_shaders_only: bool => ExportShadersOnly,
    /// Library exports: `export1[[,export1_clone,...]=internal_name][;...]` (`-exports`)
    exports: String => Exports,
    /// Assembly listing file (`-Fc`)
    assembly_listing_file: String => AssemblyListingFile,
    /// Print option names with mappable diagnostics (`-fdiagnostics-show-option` / `-fno-diagnostics-show-option`)
    diagnostics_show_option: bool => DiagnosticsShowOption,
    /// Disables source location tracking in IR (`-fdisable-loc-tracking`)
    disable_loc_tracking: bool => DisableLocTracking,
    /// Debug information file or directory (`-Fd`)
    debug_output_name: String => DebugOutputName,
    /// Warnings and errors file (`-Fe`)
    error_output_name: String => ErrorOutputName,
    /// Header file containing object code (`-Fh`)
    header_output_name: String => HeaderOutputName,
    /// Preprocess output file, used with `-P` (`-Fi`)
    preprocess_output_name: String => PreprocessOutputName,
    /// fxc-style macro operand expansion (`-flegacy-macro-expansion`)
    legacy_macro_expansion: bool => LegacyMacroExpansion,
    /// Reserve unused explicit registers like SM 5.0 (`-flegacy-resource-reservation`)
    legacy_resource_reservation: bool => LegacyResourceReservation,
    /// Heuristic late inlining for libraries (`-fnew-inlining-behavior`)
    new_inlining_behavior: bool => NewInliningBehavior,
    /// Forced root signature version (`-force-rootsig-ver`)
    root_signature_version: String => RootSignatureVersion,
    /// Object file (`-Fo`)
    object_output_name: String => ObjectOutputName,
    /// Reflection file (`-Fre`)
    reflection_output_name: String => ReflectionOutputName,
    /// Root signature file (`-Frs`)
    root_signature_output_name: String => RootSignatureOutputName,
    /// Shader hash file (`-Fsh`)
    hash_output_name: String => HashOutputName,
    /// Print a time report (`-ftime-report`)
    time_report: bool => TimeReport,
    /// Hierarchical time trace; an empty value traces to stdout (`-ftime-trace=`)
    time_trace: String => TimeTrace,
    /// Backward compatibility mode (`-Gec`)
    backward_compatibility_mode: bool => BackwardCompatibilityMode,
    /// Strict mode (`-Ges`)
    strict_mode: bool => StrictMode,
    /// Flow control preference (`-Gfa` / `-Gfp`)
    flow_control: FlowControlMode => FlowControl,
    /// IEEE strictness (`-Gis`)
    force_ieee_strictness: bool => ForceIeeeStrictness,
    /// HLSL version (`-HV`)
    language_version: LanguageVersion => LanguageVersion,
    /// Show includes and nesting depth (`-H`)
    show_includes: bool => ShowIncludes,
    /// Ignore `#line` directives (`-ignore-line-directives`)
    ignore_line_directives: bool => IgnoreLineDirectives,
    /// Hexadecimal literals in listings (`-Lx`)
    output_hex_literals: bool => OutputHexLiterals,
    /// Instruction numbers in listings (`-Ni`)
    output_instruction_numbers: bool => OutputInstructionNumbers,
    /// Non-legacy cbuffer layout (`-no-legacy-cbuf-layout`)
    no_legacy_cbuffer_layout: bool => NoLegacyCbufferLayout,
    /// Suppress warnings (`-no-warnings`)
    suppress_warnings: bool => SuppressWarnings,
    /// Instruction byte offsets in listings (`-No`)
    output_byte_offsets: bool => OutputByteOffsets,
    /// Print the optimizer commands (`-Odump`)
    print_optimizer_commands: bool => PrintOptimizerCommands,
    /// Disable optimizations (`-Od`)
    disable_optimization: bool => DisableOptimization,
    /// Optimize signature packing for identical connecting stages (`-pack-optimized`)
    optimize_signature_packing: bool => OptimizeSignaturePacking,
    /// Prefix-stable signature packing (`-pack-prefix-stable`)
    pack_prefix_stable: bool => PackPrefixStable,
    /// Recompile from a DXIL container with debug info (`-recompile`)
    recompile: bool => Recompile,
    /// Assume UAVs/SRVs may alias (`-res-may-alias`)
    resources_may_alias: bool => ResourcesMayAlias,
    /// Macro holding the root signature (`-rootsig-define`)
    root_signature_define: String => RootSignatureDefine,
    /// Disable validation (`-Vd`)
    disable_validation: bool => DisableValidation,
    /// Verify diagnostics against comment directives (`-verify`)
    verify_directives: String => VerifyDirectives,
    /// Display include process details (`-Vi`)
    display_include_details: bool => DisplayIncludeDetails,
    /// Variable name in header output (`-Vn`)
    variable_name: String => VariableName,
    /// Treat warnings as errors (`-WX`)
    warnings_as_errors: bool => WarningsAsErrors,
    /// Debug information kind (`-Zi` / `-Zs`)
    debug_info: DebugInfo => DebugInfo,
    /// Matrix packing order (`-Zpc` / `-Zpr`)
    matrix_pack_mode: MatrixPackMode => MatrixPackMode,
    /// Shader hash over the output binary only (`-Zsb`)
    binary_hash: bool => BinaryHash,
    /// Shader hash including source information (`-Zss`)
    source_hash: bool => SourceHash,

    // Optimization
    /// Finite math only (`-ffinite-math-only` / `-fno-finite-math-only`)
    finite_math_only: bool => FiniteMathOnly,
    /// Optimization level (`-O0` .. `-O3`)
    optimization: OptimizationLevel => Optimization,

    // Rewriter
    /// Collect global constants into `cbuffer GlobalCB` (`-decl-global-cb`)
    declare_global_cbuffer: bool => DeclareGlobalCbuffer,
    /// Move entry point uniforms to global scope (`-extract-entry-uniforms`)
    extract_entry_uniforms: bool => ExtractEntryUniforms,
    /// `extern` on non-static globals (`-global-extern-by-default`)
    global_extern_by_default: bool => GlobalExternByDefault,
    /// Keep user defines after rewriting (`-keep-user-macro`)
    keep_user_macro: bool => KeepUserMacro,
    /// Add line directives (`-line-directive`)
    line_directive: bool => LineDirective,
    /// Remove unused functions and types (`-remove-unused-functions`)
    remove_unused_functions: bool => RemoveUnusedFunctions,
    /// Remove unused static globals and functions (`-remove-unused-globals`)
    remove_unused_globals: bool => RemoveUnusedGlobals,
    /// Turn function definitions into declarations (`-skip-fn-body`)
    skip_function_body: bool => SkipFunctionBody,
    /// Remove static functions and globals with `-skip-fn-body` (`-skip-static`)
    skip_static: bool => SkipStatic,
    /// Rewrite without changes (`-unchanged`)
    rewrite_unchanged: bool => RewriteUnchanged,

    // SPIR-V code generation
    /// Debug info categories (`-fspv-debug=`)
    spirv_debug: String => SpirvDebug,
    /// SPIR-V entry point name (`-fspv-entrypoint-name=`)
    spirv_entry_point_name: String => SpirvEntryPointName,
    /// Permitted SPIR-V extension (`-fspv-extension=`)
    spirv_extension: String => SpirvExtension,
    /// One binding per resource array element (`-fspv-flatten-resource-arrays`)
    flatten_resource_arrays: bool => FlattenResourceArrays,
    /// Keep unused bindings (`-fspv-preserve-bindings`)
    preserve_bindings: bool => PreserveBindings,
    /// Keep unused interface variables (`-fspv-preserve-interface`)
    preserve_interface: bool => PreserveInterface,
    /// Print the module around every pass (`-fspv-print-all`)
    spirv_print_all: bool => SpirvPrintAll,
    /// Reduce composite load sizes (`-fspv-reduce-load-size`)
    reduce_load_size: bool => ReduceLoadSize,
    /// Emit reflection aids (`-fspv-reflect`)
    spirv_reflect: bool => SpirvReflect,
    /// Target environment, e.g. `vulkan1.2` (`-fspv-target-env=`)
    target_environment: String => TargetEnvironment,
    /// Legacy row-major order for raw buffer matrices (`-fspv-use-legacy-buffer-matrix-order`)
    legacy_buffer_matrix_order: bool => LegacyBufferMatrixOrder,
    /// Apply register shifts to implicit bindings (`-fvk-auto-shift-bindings`)
    auto_shift_bindings: bool => AutoShiftBindings,
    /// Binding shift for b registers: `<shift> <space>` (`-fvk-b-shift`)
    b_register_shift: String => BRegisterShift,
    /// Binding and set of `$Globals`: `<binding> <set>` (`-fvk-bind-globals`)
    globals_binding: String => GlobalsBinding,
    /// Explicit register binding: `<type-number> <space> <binding> <set>` (`-fvk-bind-register`)
    register_binding: String => RegisterBinding,
    /// Negate `SV_Position.y` (`-fvk-invert-y`)
    invert_y: bool => InvertY,
    /// Binding shift for s registers: `<shift> <space>` (`-fvk-s-shift`)
    s_register_shift: String => SRegisterShift,
    /// `SV_InstanceID` relative to the base instance (`-fvk-support-nonzero-base-instance`)
    nonzero_base_instance: bool => NonzeroBaseInstance,
    /// Binding shift for t registers: `<shift> <space>` (`-fvk-t-shift`)
    t_register_shift: String => TRegisterShift,
    /// Binding shift for u registers: `<shift> <space>` (`-fvk-u-shift`)
    u_register_shift: String => URegisterShift,
    /// DirectX memory layout (`-fvk-use-dx-layout`)
    use_dx_layout: bool => UseDxLayout,
    /// Reciprocate `SV_Position.w` in pixel shaders (`-fvk-use-dx-position-w`)
    use_dx_position_w: bool => UseDxPositionW,
    /// Strict std140/std430 layout (`-fvk-use-gl-layout`)
    use_gl_layout: bool => UseGlLayout,
    /// Scalar layout (`-fvk-use-scalar-layout`)
    use_scalar_layout: bool => UseScalarLayout,
    /// Comma-separated SPIRV-Tools passes (`-Oconfig=`)
    spirv_optimizer_config: String => SpirvOptimizerConfig,
    /// Generate SPIR-V (`-spirv`)
    generate_as_spirv: bool => GenerateAsSpirv,

    // Utility
    /// Load a binary instead of compiling (`-dumpbin`)
    dump_binary: bool => DumpBinary,
    /// Extract the root signature (`-extractrootsignature`)
    extract_root_signature: bool => ExtractRootSignature,
    /// Save private data from the blob (`-getprivate`)
    private_data_file: String => PrivateDataFile,
    /// Link libraries separated by `;` (`-link`)
    link_libraries: String => LinkLibraries,
    /// Preprocess to file (`-P`)
    preprocess_only: bool => PreprocessOnly,
    /// Embed the PDB in the container, requires `-Zi` (`-Qembed_debug`)
    embed_debug: bool => EmbedDebug,
    /// Strip debug information (`-Qstrip_debug`)
    strip_debug: bool => StripDebug,
    /// Strip private data (`-Qstrip_priv`)
    strip_private: bool => StripPrivate,
    /// Strip reflection data (`-Qstrip_reflect`)
    strip_reflection: bool => StripReflection,
    /// Strip the root signature (`-Qstrip_rootsignature`)
    strip_root_signature: bool => StripRootSignature,
    /// Private data to add to the blob (`-setprivate`)
    set_private_data: String => SetPrivateData,
    /// Root signature to attach (`-setrootsignature`)
    set_root_signature: String => SetRootSignature,
    /// Root signature to verify against (`-verifyrootsignature`)
    verify_root_signature: String => VerifyRootSignature,
}

impl CompilerOptions {
    /// Returns the target profile
    pub fn profile(&self) -> &ShaderProfile {
        &self.profile
    }

    /// Returns the target profile for modification
    pub fn profile_mut(&mut self) -> &mut ShaderProfile {
        &mut self.profile
    }

    /// Replaces the target profile
    pub fn set_profile(&mut self, profile: ShaderProfile) {
        self.profile = profile;
    }

    /// Defines a macro, replacing any previous value with the same name
    pub fn set_macro(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.macros.insert(name.into(), value.into());
    }

    /// Removes a macro, keeping the order of the remaining ones
    pub fn remove_macro(&mut self, name: &str) -> Option<String> {
        self.macros.shift_remove(name)
    }

    /// Returns the defined macros in insertion order
    pub fn macros(&self) -> &IndexMap<String, String> {
        &self.macros
    }

    /// Enables or disables a warning by name
    pub fn set_warning(&mut self, name: impl Into<String>, enabled: bool) {
        self.warnings.insert(name.into(), enabled);
    }

    /// Removes a warning override, keeping the order of the remaining ones
    pub fn remove_warning(&mut self, name: &str) -> Option<bool> {
        self.warnings.shift_remove(name)
    }

    /// Returns the warning overrides in insertion order
    pub fn warnings(&self) -> &IndexMap<String, bool> {
        &self.warnings
    }

    /// Sets the entry point (builder pattern)
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    /// Defines a macro (builder pattern)
    pub fn with_macro(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_macro(name, value);
        self
    }

    /// Sets a warning override (builder pattern)
    pub fn with_warning(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.set_warning(name, enabled);
        self
    }

    /// Validates the profile and serializes the configuration.
    pub fn arguments(&self) -> Result<Vec<String>> {
        crate::ArgumentBuilder::new(self).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_by_default() {
        let options = CompilerOptions::new(ShaderProfile::PS_6_0);
        for setting in Setting::ALL {
            if *setting == Setting::Profile {
                assert!(options.value(*setting).is_some());
            } else {
                assert_eq!(options.value(*setting), None, "{setting:?} should start unset");
            }
        }
    }

    #[test]
    fn test_field_values() {
        let mut options = CompilerOptions::new(ShaderProfile::VS_6_0);
        options.entry_point = Some("vs_main".to_string());
        options.auto_binding_space = Some(3);
        options.optimization = Some(OptimizationLevel::O2);

        assert_eq!(
            options.value(Setting::EntryPoint),
            Some(OptionValue::Text(Cow::Borrowed("vs_main")))
        );
        assert_eq!(
            options.value(Setting::AutoBindingSpace),
            Some(OptionValue::Number(3))
        );
        assert_eq!(
            options.value(Setting::Optimization),
            Some(OptionValue::Choice {
                discriminant: 2,
                symbol: "o2"
            })
        );
        assert_eq!(
            options.value(Setting::Profile),
            Some(OptionValue::Text(Cow::Owned("vs_6_0".to_string())))
        );
    }

    #[test]
    fn test_macro_order_and_replace() {
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0)
            .with_macro("FOO", "1")
            .with_macro("BAR", "baz");
        options.set_macro("FOO", "2");

        let macros: Vec<_> = options.macros().iter().collect();
        assert_eq!(
            macros,
            vec![
                (&"FOO".to_string(), &"2".to_string()),
                (&"BAR".to_string(), &"baz".to_string())
            ]
        );

        assert_eq!(options.remove_macro("FOO"), Some("2".to_string()));
        assert_eq!(options.macros().len(), 1);
        assert_eq!(options.remove_macro("FOO"), None);
    }

    #[test]
    fn test_warnings() {
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0).with_warning("unused", true);
        options.set_warning("unused", false);
        assert_eq!(options.warnings().get("unused"), Some(&false));
        assert_eq!(options.remove_warning("unused"), Some(false));
        assert!(options.warnings().is_empty());
    }

    #[test]
    fn test_enum_symbols() {
        assert_eq!(LanguageVersion::V2021.symbol(), "_2021");
        assert_eq!(DenormalMode::Ftz.symbol(), "ftz");
        assert_eq!(OptimizationLevel::ALL.len(), 4);
    }
}

//! Serialization of [`CompilerOptions`] into compiler arguments

use crate::options::{
    Assignment, CompilerOptions, OPTION_TABLE, OptionDef, OptionKind, OptionValue,
    PROFILE_OPTION, Setting,
};
use crate::Result;

/// Ordered list of argument tokens passed to the compiler
pub type ArgumentList = Vec<String>;

/// Turns a configuration into an ordered argument list.
///
/// Declared options come first, in table order, followed by macros and then
/// warning overrides in insertion order. The output is deterministic for a
/// given configuration.
///
/// # Example
/// ```
/// use dxcrs::{ArgumentBuilder, CompilerOptions, DebugInfo, ShaderProfile};
///
/// let mut options = CompilerOptions::new(ShaderProfile::VS_6_0).with_entry_point("main");
/// options.generate_as_spirv = Some(true);
/// options.debug_info = Some(DebugInfo::Slim);
///
/// let args = ArgumentBuilder::new(&options).build().unwrap();
/// assert_eq!(args, ["-E", "main", "-T", "vs_6_0", "-Zs", "-spirv"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ArgumentBuilder<'a> {
    options: &'a CompilerOptions,
    table: &'a [OptionDef],
}

impl<'a> ArgumentBuilder<'a> {
    /// Creates a builder over the full option table.
    pub fn new(options: &'a CompilerOptions) -> Self {
        Self::with_table(options, OPTION_TABLE)
    }

    /// Creates a builder over a custom table.
    ///
    /// A table without a profile entry still gets `-T <profile>`, ahead of
    /// the table's own options.
    pub fn with_table(options: &'a CompilerOptions, table: &'a [OptionDef]) -> Self {
        ArgumentBuilder { options, table }
    }

    /// Validates the profile and serializes the configuration.
    ///
    /// Fails only on an invalid profile. Unset options and enum values with
    /// no flag are skipped silently.
    pub fn build(&self) -> Result<ArgumentList> {
        self.options.profile().validate()?;

        let mut args = ArgumentList::new();

        if !self.table.iter().any(|def| def.setting == Setting::Profile) {
            if let Some(value) = self.options.value(Setting::Profile) {
                push_option(&mut args, &PROFILE_OPTION, value);
            }
        }

        for def in self.table {
            if let Some(value) = self.options.value(def.setting) {
                push_option(&mut args, def, value);
            }
        }

        for (name, value) in self.options.macros() {
            args.push("-D".to_string());
            args.push(format!("{}={}", name, value));
        }

        for (name, enabled) in self.options.warnings() {
            let prefix = if *enabled { "-W" } else { "-Wno-" };
            args.push(format!("{}{}", prefix, name));
        }

        log::debug!("Built {} compiler arguments: {:?}", args.len(), args);

        Ok(args)
    }
}

fn push_option(args: &mut ArgumentList, def: &OptionDef, value: OptionValue<'_>) {
    match (def.kind, value) {
        (OptionKind::Flag, OptionValue::Bool(enabled)) => {
            if enabled {
                args.push(def.name.to_string());
            }
        }
        (OptionKind::PairedSwitch, OptionValue::Bool(enabled)) => {
            if let Some(flag) = def.flag_for(i32::from(enabled)) {
                args.push(flag.to_string());
            }
        }
        (OptionKind::Enum, OptionValue::Choice { discriminant, symbol }) => {
            if def.is_symbolic() {
                push_value(args, def, &symbol.replace('_', ""));
            } else if let Some(flag) = def.flag_for(discriminant) {
                args.push(flag.to_string());
            }
        }
        (OptionKind::ScalarString, OptionValue::Text(text)) => push_value(args, def, &text),
        (OptionKind::Numeric, OptionValue::Number(number)) => {
            push_value(args, def, &number.to_string())
        }
        (kind, value) => {
            log::warn!(
                "Skipping {}: {:?} option holds {:?}",
                def.name,
                kind,
                value
            );
        }
    }
}

fn push_value(args: &mut ArgumentList, def: &OptionDef, value: &str) {
    if value.trim().is_empty() {
        args.push(def.name.to_string());
        return;
    }

    match def.assignment {
        Assignment::Spaced => {
            args.push(def.name.to_string());
            args.push(value.to_string());
        }
        Assignment::Equals => args.push(format!("{}={}", def.name, normalize_value(value))),
        Assignment::FlagOnly => args.push(def.name.to_string()),
    }
}

/// Canonical form of an `=`-joined value: lower case, with whitespace and
/// underscores removed.
pub fn normalize_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{
        DebugInfo, DenormalMode, LanguageVersion, Linkage, OptimizationLevel,
    };
    use crate::{Error, ShaderProfile, ShaderStage};
    use pretty_assertions::assert_eq;

    fn build(options: &CompilerOptions) -> Vec<String> {
        ArgumentBuilder::new(options).build().unwrap()
    }

    #[test]
    fn test_profile_only() {
        let options = CompilerOptions::new(ShaderProfile::PS_6_0);
        assert_eq!(build(&options), ["-T", "ps_6_0"]);
    }

    #[test]
    fn test_end_to_end() {
        let mut options = CompilerOptions::new(ShaderProfile::VS_6_0).with_entry_point("main");
        options.generate_as_spirv = Some(true);
        options.debug_info = Some(DebugInfo::Slim);

        let first = build(&options);
        assert_eq!(first, ["-E", "main", "-T", "vs_6_0", "-Zs", "-spirv"]);
        assert_eq!(build(&options), first);
    }

    #[test]
    fn test_invalid_profile_fails_before_serializing() {
        let mut options = CompilerOptions::new(ShaderProfile::MS_6_5);
        options.profile_mut().set_model(5, 0);
        options.generate_as_spirv = Some(true);

        let err = ArgumentBuilder::new(&options).build().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidProfile {
                stage: ShaderStage::Mesh,
                ..
            }
        ));
    }

    #[test]
    fn test_flag_toggle() {
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0);
        options.warnings_as_errors = Some(true);
        assert!(build(&options).contains(&"-WX".to_string()));

        options.warnings_as_errors = Some(false);
        assert_eq!(build(&options), ["-T", "ps_6_0"]);
    }

    #[test]
    fn test_every_flag_toggles() {
        for def in OPTION_TABLE
            .iter()
            .filter(|def| def.kind == OptionKind::Flag)
        {
            let mut on = ArgumentList::new();
            push_option(&mut on, def, OptionValue::Bool(true));
            assert_eq!(on, [def.name], "{:?} = true", def.setting);

            let mut off = ArgumentList::new();
            push_option(&mut off, def, OptionValue::Bool(false));
            assert!(off.is_empty(), "{:?} = false", def.setting);
        }
    }

    #[test]
    fn test_paired_switch_emits_one_side() {
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0);

        options.finite_math_only = Some(true);
        let on = build(&options);
        assert!(on.contains(&"-ffinite-math-only".to_string()));
        assert!(!on.contains(&"-fno-finite-math-only".to_string()));

        options.finite_math_only = Some(false);
        let off = build(&options);
        assert!(off.contains(&"-fno-finite-math-only".to_string()));
        assert!(!off.contains(&"-ffinite-math-only".to_string()));
    }

    #[test]
    fn test_every_paired_switch() {
        for def in OPTION_TABLE
            .iter()
            .filter(|def| def.kind == OptionKind::PairedSwitch)
        {
            for enabled in [true, false] {
                let mut args = ArgumentList::new();
                push_option(&mut args, def, OptionValue::Bool(enabled));
                assert_eq!(args.len(), 1, "{:?} = {}", def.setting, enabled);
            }
        }
    }

    #[test]
    fn test_macros_in_insertion_order() {
        let options = CompilerOptions::new(ShaderProfile::PS_6_0)
            .with_macro("FOO", "1")
            .with_macro("BAR", "baz");
        assert_eq!(
            build(&options),
            ["-T", "ps_6_0", "-D", "FOO=1", "-D", "BAR=baz"]
        );
    }

    #[test]
    fn test_warnings() {
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0);
        options.set_warning("unused", false);
        assert_eq!(build(&options), ["-T", "ps_6_0", "-Wno-unused"]);

        options.set_warning("unused", true);
        assert_eq!(build(&options), ["-T", "ps_6_0", "-Wunused"]);
    }

    #[test]
    fn test_macros_before_warnings() {
        let options = CompilerOptions::new(ShaderProfile::PS_6_0)
            .with_warning("unused-value", false)
            .with_macro("MAX_LIGHTS", "4");
        assert_eq!(
            build(&options),
            ["-T", "ps_6_0", "-D", "MAX_LIGHTS=4", "-Wno-unused-value"]
        );
    }

    #[test]
    fn test_enum_without_flag_is_skipped() {
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0);
        options.debug_info = Some(DebugInfo::Random);
        assert_eq!(build(&options), ["-T", "ps_6_0"]);
    }

    #[test]
    fn test_enum_flags() {
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0);
        options.optimization = Some(OptimizationLevel::O3);
        options.debug_info = Some(DebugInfo::Normal);
        assert_eq!(build(&options), ["-T", "ps_6_0", "-Zi", "-O3"]);
    }

    #[test]
    fn test_symbolic_enums() {
        let mut options = CompilerOptions::new(ShaderProfile::LIB_6_3);
        options.language_version = Some(LanguageVersion::V2021);
        options.denormal_mode = Some(DenormalMode::Ftz);
        options.default_linkage = Some(Linkage::External);
        assert_eq!(
            build(&options),
            [
                "-T",
                "lib_6_3",
                "-default-linkage",
                "external",
                "-denorm",
                "ftz",
                "-HV",
                "2021"
            ]
        );
    }

    #[test]
    fn test_equals_assignment_normalized() {
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0);
        options.target_environment = Some("Vulkan 1.2".to_string());
        options.spirv_debug = Some("vulkan_with_source".to_string());
        assert_eq!(
            build(&options),
            [
                "-T",
                "ps_6_0",
                "-fspv-debug=vulkanwithsource",
                "-fspv-target-env=vulkan1.2"
            ]
        );
    }

    #[test]
    fn test_spaced_assignment_raw() {
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0);
        options.b_register_shift = Some("4 0".to_string());
        options.variable_name = Some("g_Shader_PS".to_string());
        assert_eq!(
            build(&options),
            [
                "-T",
                "ps_6_0",
                "-Vn",
                "g_Shader_PS",
                "-fvk-b-shift",
                "4 0"
            ]
        );
    }

    #[test]
    fn test_empty_string_emits_name_only() {
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0);
        options.time_trace = Some(String::new());
        options.exports = Some("  ".to_string());
        assert_eq!(
            build(&options),
            ["-T", "ps_6_0", "-exports", "-ftime-trace"]
        );
    }

    #[test]
    fn test_numeric() {
        let mut options = CompilerOptions::new(ShaderProfile::LIB_6_3);
        options.auto_binding_space = Some(12);
        assert_eq!(
            build(&options),
            ["-T", "lib_6_3", "-auto-binding-space", "12"]
        );
    }

    #[test]
    fn test_custom_table() {
        let table = [OptionDef::flag(Setting::StripDebug, "-Qstrip_debug")];
        let mut options = CompilerOptions::new(ShaderProfile::PS_6_0);
        options.strip_debug = Some(true);
        options.generate_as_spirv = Some(true);

        let args = ArgumentBuilder::with_table(&options, &table).build().unwrap();
        assert_eq!(args, ["-T", "ps_6_0", "-Qstrip_debug"]);
    }

    #[test]
    fn test_empty_table_keeps_profile() {
        let options = CompilerOptions::new(ShaderProfile::PS_6_0).with_macro("FOO", "1");
        let args = ArgumentBuilder::with_table(&options, &[]).build().unwrap();
        assert_eq!(args, ["-T", "ps_6_0", "-D", "FOO=1"]);
    }

    #[test]
    fn test_profile_emitted_once() {
        let table = [
            OptionDef::flag(Setting::StripDebug, "-Qstrip_debug"),
            PROFILE_OPTION,
        ];
        let mut options = CompilerOptions::new(ShaderProfile::CS_6_0);
        options.strip_debug = Some(true);

        let args = ArgumentBuilder::with_table(&options, &table).build().unwrap();
        assert_eq!(args, ["-Qstrip_debug", "-T", "cs_6_0"]);
        assert_eq!(args.iter().filter(|arg| *arg == "-T").count(), 1);
    }

    #[test]
    fn test_normalize_value() {
        assert_eq!(normalize_value("Vulkan_1.3 "), "vulkan1.3");
        assert_eq!(normalize_value("line,\ttool"), "line,tool");
    }
}

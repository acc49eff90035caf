//! DirectX Shader Compiler CLI tool using the safe Rust API

use clap::{Args, Parser, Subcommand, ValueEnum};
use dxcrs::{
    Compiler, CompilerOptions, DebugInfo, DxcLibrary, FileSystemInclude, LanguageVersion,
    MatrixPackMode, NativeBackend, OptimizationLevel, OutKind, OutputKinds, ShaderProfile,
    ShaderStage,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dxcrs")]
#[command(about = "DirectX Shader Compiler command-line tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the compiler arguments for a configuration
    Args {
        #[command(flatten)]
        options: OptionArgs,

        /// Print all arguments on one line
        #[arg(long)]
        inline: bool,
    },

    /// Compile HLSL shader to DXIL or SPIR-V
    Compile {
        /// Input HLSL file
        input: PathBuf,

        #[command(flatten)]
        options: OptionArgs,

        /// Output file (default: <input>.dxil, or <input>.spv with --spirv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to the dxcwrapper shared library (default: next to this executable)
        #[arg(long, value_name = "PATH")]
        library: Option<PathBuf>,

        /// Additional include directories
        #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /// Also write the reflection data to this file
        #[arg(long, value_name = "PATH")]
        reflection: Option<PathBuf>,
    },

    /// List shader stages and the minimum shader model each requires
    Profiles,
}

/// Options shared by `args` and `compile`
#[derive(Args, Debug)]
struct OptionArgs {
    /// Target profile (e.g., vs_6_0, ps_6_6, lib_6_3)
    #[arg(short = 'T', long, value_parser = parse_profile)]
    profile: ShaderProfile,

    /// Entry point function name
    #[arg(short = 'E', long)]
    entry: Option<String>,

    /// Optimization level 0-3
    #[arg(short = 'O', long, value_parser = clap::value_parser!(u8).range(0..=3))]
    optimize: Option<u8>,

    /// Disable optimizations
    #[arg(long)]
    no_optimize: bool,

    /// Debug information to embed
    #[arg(long, value_enum)]
    debug_info: Option<DebugInfoArg>,

    /// Matrix packing order
    #[arg(long, value_enum)]
    matrix_packing: Option<MatrixPackingArg>,

    /// HLSL language version
    #[arg(long, value_enum)]
    hlsl_version: Option<HlslVersionArg>,

    /// Generate SPIR-V instead of DXIL
    #[arg(long)]
    spirv: bool,

    /// SPIR-V target environment (e.g., vulkan1.2)
    #[arg(long, value_name = "ENV")]
    target_env: Option<String>,

    /// Use native 16-bit types
    #[arg(long)]
    enable_16bit_types: bool,

    /// Treat warnings as errors
    #[arg(long)]
    warnings_as_errors: bool,

    /// Skip validation
    #[arg(long)]
    disable_validation: bool,

    /// Strip debug information from the object
    #[arg(long)]
    strip_debug: bool,

    /// Strip reflection data from the object
    #[arg(long)]
    strip_reflection: bool,

    /// Preprocessor defines (NAME=VALUE or NAME)
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE")]
    defines: Vec<String>,

    /// Enable (NAME) or disable (no-NAME) a warning
    #[arg(short = 'W', long = "warning", value_name = "[no-]NAME")]
    warnings: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DebugInfoArg {
    /// Full debug information (-Zi)
    Normal,
    /// Slim PDB (-Zs)
    Slim,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum MatrixPackingArg {
    /// Column major (-Zpc)
    #[value(name = "column-major")]
    ColumnMajor,
    /// Row major (-Zpr)
    #[value(name = "row-major")]
    RowMajor,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum HlslVersionArg {
    #[value(name = "2016")]
    V2016,
    #[value(name = "2017")]
    V2017,
    #[value(name = "2018")]
    V2018,
    #[value(name = "2021")]
    V2021,
}

impl From<DebugInfoArg> for DebugInfo {
    fn from(arg: DebugInfoArg) -> Self {
        match arg {
            DebugInfoArg::Normal => DebugInfo::Normal,
            DebugInfoArg::Slim => DebugInfo::Slim,
        }
    }
}

impl From<MatrixPackingArg> for MatrixPackMode {
    fn from(arg: MatrixPackingArg) -> Self {
        match arg {
            MatrixPackingArg::ColumnMajor => MatrixPackMode::ColumnMajor,
            MatrixPackingArg::RowMajor => MatrixPackMode::RowMajor,
        }
    }
}

impl From<HlslVersionArg> for LanguageVersion {
    fn from(arg: HlslVersionArg) -> Self {
        match arg {
            HlslVersionArg::V2016 => LanguageVersion::V2016,
            HlslVersionArg::V2017 => LanguageVersion::V2017,
            HlslVersionArg::V2018 => LanguageVersion::V2018,
            HlslVersionArg::V2021 => LanguageVersion::V2021,
        }
    }
}

fn parse_profile(s: &str) -> Result<ShaderProfile, String> {
    s.parse().map_err(|e: dxcrs::Error| e.to_string())
}

fn parse_define(s: &str) -> (String, String) {
    s.split_once('=')
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .unwrap_or_else(|| (s.to_string(), "1".to_string()))
}

fn parse_warning(s: &str) -> (String, bool) {
    match s.strip_prefix("no-") {
        Some(name) => (name.to_string(), false),
        None => (s.to_string(), true),
    }
}

/// `Some(true)` for a set switch, unset otherwise
fn switch(enabled: bool) -> Option<bool> {
    enabled.then_some(true)
}

impl OptionArgs {
    fn to_options(&self) -> CompilerOptions {
        let mut options = CompilerOptions::new(self.profile);

        options.entry_point = self.entry.clone();
        options.optimization = self.optimize.map(|level| match level {
            0 => OptimizationLevel::O0,
            1 => OptimizationLevel::O1,
            2 => OptimizationLevel::O2,
            _ => OptimizationLevel::O3,
        });
        options.disable_optimization = switch(self.no_optimize);
        options.debug_info = self.debug_info.map(Into::into);
        options.matrix_pack_mode = self.matrix_packing.map(Into::into);
        options.language_version = self.hlsl_version.map(Into::into);
        options.generate_as_spirv = switch(self.spirv);
        options.target_environment = self.target_env.clone();
        options.enable_16bit_types = switch(self.enable_16bit_types);
        options.warnings_as_errors = switch(self.warnings_as_errors);
        options.disable_validation = switch(self.disable_validation);
        options.strip_debug = switch(self.strip_debug);
        options.strip_reflection = switch(self.strip_reflection);

        for define in &self.defines {
            let (name, value) = parse_define(define);
            options.set_macro(name, value);
        }

        for warning in &self.warnings {
            let (name, enabled) = parse_warning(warning);
            options.set_warning(name, enabled);
        }

        options
    }
}

fn print_arguments(options: OptionArgs, inline: bool) -> Result<(), String> {
    let arguments = options
        .to_options()
        .arguments()
        .map_err(|e| format!("{}", e))?;

    if inline {
        println!("{}", arguments.join(" "));
    } else {
        for argument in arguments {
            println!("{}", argument);
        }
    }

    Ok(())
}

fn compile_shader(
    input: PathBuf,
    options: OptionArgs,
    output: Option<PathBuf>,
    library: Option<PathBuf>,
    include_dirs: Vec<PathBuf>,
    reflection: Option<PathBuf>,
) -> Result<(), String> {
    let extension = if options.spirv { "spv" } else { "dxil" };
    let output = output.unwrap_or_else(|| input.with_extension(extension));

    let source = std::fs::read_to_string(&input)
        .map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;

    let library = match library {
        Some(path) => DxcLibrary::load(path),
        None => DxcLibrary::load_default(),
    }
    .map_err(|e| format!("{}", e))?;
    log::info!("Using {}", library.path().display());

    let mut compiler = Compiler::new(NativeBackend::new(Arc::new(library)))
        .map_err(|e| format!("{}", e))?;

    let mut include = FileSystemInclude::new();
    if let Some(parent) = input.parent() {
        include.add_path(parent);
    }
    for dir in include_dirs {
        include.add_path(dir);
    }

    let collect = if reflection.is_some() {
        OutputKinds::REFLECTION
    } else {
        OutputKinds::empty()
    };

    let result = compiler
        .compile_with_options(&source, &options.to_options(), collect, Some(&mut include))
        .map_err(|e| format!("{}", e))?;

    let shader = result.into_result().map_err(|e| format!("{}", e))?;

    std::fs::write(&output, &shader.object)
        .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;

    eprintln!(
        "Compiled {} -> {} ({} bytes)",
        input.display(),
        output.display(),
        shader.object.len()
    );

    if let Some(path) = reflection {
        match shader.outputs.get(&OutKind::Reflection) {
            Some(data) => {
                std::fs::write(&path, &data.data)
                    .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
                eprintln!("Reflection -> {} ({} bytes)", path.display(), data.len());
            }
            None => log::warn!("The compiler produced no reflection data"),
        }
    }

    if let Some(warnings) = shader.warnings {
        eprintln!("Warnings:\n{}", warnings);
    }

    Ok(())
}

fn list_profiles() -> Result<(), String> {
    println!("{:<14} {:<7} Minimum model", "Stage", "Prefix");
    for stage in ShaderStage::ALL {
        let (major, minor) = stage.minimum_model();
        println!(
            "{:<14} {:<7} {}.{}",
            stage.to_string(),
            stage.abbreviation(),
            major,
            minor
        );
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Args { options, inline } => print_arguments(options, inline),
        Commands::Compile {
            input,
            options,
            output,
            library,
            include_dirs,
            reflection,
        } => compile_shader(input, options, output, library, include_dirs, reflection),
        Commands::Profiles => list_profiles(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

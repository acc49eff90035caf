//! Shader profiles (shader stage + shader model)

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Pipeline stage a shader is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Pixel (fragment) shader
    Pixel,
    /// Domain (tessellation evaluation) shader
    Domain,
    /// Hull (tessellation control) shader
    Hull,
    /// Mesh shader
    Mesh,
    /// Amplification (task) shader
    Amplification,
    /// Shader library
    Library,
    /// Geometry shader
    Geometry,
    /// Compute shader
    Compute,
}

impl ShaderStage {
    /// Every stage, in declaration order
    pub const ALL: [ShaderStage; 9] = [
        ShaderStage::Vertex,
        ShaderStage::Pixel,
        ShaderStage::Domain,
        ShaderStage::Hull,
        ShaderStage::Mesh,
        ShaderStage::Amplification,
        ShaderStage::Library,
        ShaderStage::Geometry,
        ShaderStage::Compute,
    ];

    /// Returns the profile prefix (vs, ps, ds, hs, ms, as, lib, gs, cs)
    pub fn abbreviation(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs",
            ShaderStage::Pixel => "ps",
            ShaderStage::Domain => "ds",
            ShaderStage::Hull => "hs",
            ShaderStage::Mesh => "ms",
            ShaderStage::Amplification => "as",
            ShaderStage::Library => "lib",
            ShaderStage::Geometry => "gs",
            ShaderStage::Compute => "cs",
        }
    }

    /// Returns the lowest shader model (major, minor) that supports the stage
    pub fn minimum_model(&self) -> (u32, u32) {
        match self {
            ShaderStage::Vertex
            | ShaderStage::Pixel
            | ShaderStage::Geometry
            | ShaderStage::Compute => (4, 0),
            ShaderStage::Domain | ShaderStage::Hull => (5, 0),
            ShaderStage::Library => (5, 1),
            ShaderStage::Mesh | ShaderStage::Amplification => (6, 0),
        }
    }

    /// Looks up a stage by its profile prefix
    pub fn from_abbreviation(abbreviation: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.abbreviation() == abbreviation)
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Target profile: shader stage plus shader model version.
///
/// Serialized as `<stage>_<major>_<minor>`, e.g. `vs_6_0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderProfile {
    stage: ShaderStage,
    major: u32,
    minor: u32,
}

impl ShaderProfile {
    pub const VS_6_0: ShaderProfile = ShaderProfile::new_unchecked(ShaderStage::Vertex, 6, 0);
    pub const PS_6_0: ShaderProfile = ShaderProfile::new_unchecked(ShaderStage::Pixel, 6, 0);
    pub const GS_6_0: ShaderProfile = ShaderProfile::new_unchecked(ShaderStage::Geometry, 6, 0);
    pub const HS_6_0: ShaderProfile = ShaderProfile::new_unchecked(ShaderStage::Hull, 6, 0);
    pub const DS_6_0: ShaderProfile = ShaderProfile::new_unchecked(ShaderStage::Domain, 6, 0);
    pub const CS_6_0: ShaderProfile = ShaderProfile::new_unchecked(ShaderStage::Compute, 6, 0);
    pub const MS_6_5: ShaderProfile = ShaderProfile::new_unchecked(ShaderStage::Mesh, 6, 5);
    pub const AS_6_5: ShaderProfile = ShaderProfile::new_unchecked(ShaderStage::Amplification, 6, 5);
    pub const LIB_6_3: ShaderProfile = ShaderProfile::new_unchecked(ShaderStage::Library, 6, 3);

    /// Creates a profile, rejecting stage/model combinations the stage
    /// does not support (e.g. a mesh shader on shader model 5.0).
    pub fn new(stage: ShaderStage, major: u32, minor: u32) -> Result<Self> {
        let profile = Self::new_unchecked(stage, major, minor);
        profile.validate()?;
        Ok(profile)
    }

    const fn new_unchecked(stage: ShaderStage, major: u32, minor: u32) -> Self {
        ShaderProfile {
            stage,
            major,
            minor,
        }
    }

    /// Returns the shader stage
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Returns the major shader model version
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Returns the minor shader model version
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Changes the stage. Not validated until [`validate`](Self::validate).
    pub fn set_stage(&mut self, stage: ShaderStage) {
        self.stage = stage;
    }

    /// Changes the shader model. Not validated until [`validate`](Self::validate).
    pub fn set_model(&mut self, major: u32, minor: u32) {
        self.major = major;
        self.minor = minor;
    }

    /// Returns true if the stage supports the configured shader model
    pub fn is_valid(&self) -> bool {
        self.minor < 10 && (self.major, self.minor) >= self.stage.minimum_model()
    }

    /// Checks the profile, describing the violated minimum on failure
    pub fn validate(&self) -> Result<()> {
        if self.minor >= 10 {
            return Err(Error::InvalidParameter(format!(
                "shader model minor version {} is out of range",
                self.minor
            )));
        }

        if !self.is_valid() {
            return Err(Error::InvalidProfile {
                stage: self.stage,
                major: self.major,
                minor: self.minor,
                minimum: self.stage.minimum_model(),
            });
        }

        Ok(())
    }

    /// Parses `<stage>_<major>_<minor>` (e.g. `ps_6_0`) and validates it.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidParameter(format!("invalid shader profile: {s:?}"));

        let mut parts = s.split('_');
        let (Some(stage), Some(major), Some(minor), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let stage = ShaderStage::from_abbreviation(stage).ok_or_else(invalid)?;
        let major = major.parse().map_err(|_| invalid())?;
        let minor = minor.parse().map_err(|_| invalid())?;

        Self::new(stage, major, minor)
    }
}

impl FromStr for ShaderProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ShaderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.stage.abbreviation(),
            self.major,
            self.minor
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_strings() {
        assert_eq!(ShaderProfile::VS_6_0.to_string(), "vs_6_0");
        assert_eq!(ShaderProfile::MS_6_5.to_string(), "ms_6_5");
        assert_eq!(ShaderProfile::LIB_6_3.to_string(), "lib_6_3");
        assert_eq!(
            ShaderProfile::new(ShaderStage::Amplification, 6, 6)
                .unwrap()
                .to_string(),
            "as_6_6"
        );
    }

    #[test]
    fn test_mesh_requires_sm6() {
        let err = ShaderProfile::new(ShaderStage::Mesh, 5, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidProfile {
                stage: ShaderStage::Mesh,
                minimum: (6, 0),
                ..
            }
        ));

        assert!(ShaderProfile::new(ShaderStage::Mesh, 6, 0).is_ok());
    }

    #[test]
    fn test_minimum_is_inclusive() {
        for stage in ShaderStage::ALL {
            let (major, minor) = stage.minimum_model();
            assert!(
                ShaderProfile::new(stage, major, minor).is_ok(),
                "{stage} should accept its own minimum"
            );
        }
        assert!(ShaderProfile::new(ShaderStage::Library, 5, 0).is_err());
        assert!(ShaderProfile::new(ShaderStage::Hull, 4, 1).is_err());
    }

    #[test]
    fn test_parse_roundtrip() {
        for text in ["vs_6_0", "ps_5_1", "lib_6_3", "ms_6_5"] {
            let profile: ShaderProfile = text.parse().unwrap();
            assert_eq!(profile.to_string(), text);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ShaderProfile::parse("vs_6").is_err());
        assert!(ShaderProfile::parse("xx_6_0").is_err());
        assert!(ShaderProfile::parse("vs_6_0_1").is_err());
        assert!(ShaderProfile::parse("vs_a_0").is_err());
        assert!(ShaderProfile::parse("as_5_0").is_err());
    }

    #[test]
    fn test_setters_defer_validation() {
        let mut profile = ShaderProfile::VS_6_0;
        profile.set_stage(ShaderStage::Mesh);
        profile.set_model(5, 1);
        assert!(!profile.is_valid());
        assert!(profile.validate().is_err());

        profile.set_model(6, 5);
        assert!(profile.validate().is_ok());
    }
}

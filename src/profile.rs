// src/profile.rs

//! Build profile: settings x pruned options, as seen by the build tool

use crate::error::Result;
use crate::options::{OptionSet, OptionValue};
use crate::settings::Settings;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// One cache definition handed to the build tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub name: String,
    pub value: String,
}

impl Definition {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }

    fn on_off(name: &str, on: bool) -> Self {
        Self::new(name, if on { "ON" } else { "OFF" })
    }
}

/// Derived configuration driving one build
///
/// Never stored: it is recomputed from settings and options whenever it is
/// needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProfile {
    settings: Settings,
    options: OptionSet,
    definitions: Vec<Definition>,
}

impl BuildProfile {
    pub fn derive(settings: &Settings, options: &OptionSet) -> Result<Self> {
        let mut definitions = Vec::new();

        if let Some(build_type) = settings.build_type() {
            definitions.push(Definition::new("CMAKE_BUILD_TYPE", build_type));
        }

        if let Some(std) = settings.cppstd()? {
            definitions.push(Definition::new("CMAKE_CXX_STANDARD", std.short().to_string()));
            definitions.push(Definition::on_off("CMAKE_CXX_STANDARD_REQUIRED", true));
            definitions.push(Definition::on_off("CMAKE_CXX_EXTENSIONS", std.is_gnu()));
        }

        if let Some(shared) = options.get_safe("shared").and_then(OptionValue::as_bool) {
            definitions.push(Definition::on_off("BUILD_SHARED_LIBS", shared));
        }

        // Absent fPIC must not reach the build tool at all
        if let Some(fpic) = options.get_safe("fPIC").and_then(OptionValue::as_bool) {
            definitions.push(Definition::on_off("CMAKE_POSITION_INDEPENDENT_CODE", fpic));
        }

        if let Some(visibility) = options.get_safe("visibility").and_then(OptionValue::as_str) {
            definitions.push(Definition::new("CMAKE_CXX_VISIBILITY_PRESET", visibility));
            definitions.push(Definition::on_off(
                "CMAKE_VISIBILITY_INLINES_HIDDEN",
                visibility == "hidden",
            ));
        }

        Ok(Self {
            settings: settings.clone(),
            options: options.clone(),
            definitions,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub fn build_type(&self) -> &str {
        self.settings.build_type().unwrap_or("Release")
    }

    /// Identity of the binary this profile produces
    ///
    /// sha256 over the sorted settings and the present options. Pruned
    /// options do not contribute, so `fPIC=True` and `fPIC=False` give the
    /// same id once `fPIC` has been removed.
    pub fn package_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"[settings]\n");
        for (key, value) in self.settings.iter() {
            hasher.update(format!("{}={}\n", key, value).as_bytes());
        }

        let mut options: Vec<(&str, String)> = self
            .options
            .present()
            .map(|(name, value)| (name, value.to_string()))
            .collect();
        options.sort();

        hasher.update(b"[options]\n");
        for (name, value) in options {
            hasher.update(format!("{}={}\n", name, value).as_bytes());
        }

        hex::encode(hasher.finalize())
    }
}

/// Whether `settings` target a different platform than the host
pub fn is_cross_building(settings: &Settings) -> bool {
    let host = Settings::host();
    let differs = |target: Option<&str>, host: Option<&str>| match (target, host) {
        (Some(t), Some(h)) => t != h,
        _ => false,
    };
    differs(settings.os(), host.os()) || differs(settings.arch(), host.arch())
}

/// Whether binaries built for `settings` can run here
///
/// An explicit override (`tools.build.cross_building:can_run`) wins;
/// otherwise only native builds can run their binaries.
pub fn can_run(settings: &Settings, can_run_override: Option<bool>) -> bool {
    can_run_override.unwrap_or_else(|| !is_cross_building(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{prune, OptionDecl};

    fn declared() -> OptionSet {
        OptionSet::from_decls(&[
            OptionDecl::boolean("shared", false),
            OptionDecl::boolean("fPIC", true).removable(),
            OptionDecl::choice("visibility", &["default", "hidden"], "hidden"),
        ])
        .unwrap()
    }

    fn value_of<'a>(profile: &'a BuildProfile, name: &str) -> Option<&'a str> {
        profile
            .definitions()
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    #[test]
    fn test_definitions_linux_static() {
        let settings = Settings::from_pairs([
            ("os", "Linux"),
            ("build_type", "Debug"),
            ("compiler.cppstd", "gnu20"),
        ]);
        let options = prune(&settings, &declared());
        let profile = BuildProfile::derive(&settings, &options).unwrap();

        assert_eq!(value_of(&profile, "CMAKE_BUILD_TYPE"), Some("Debug"));
        assert_eq!(value_of(&profile, "CMAKE_CXX_STANDARD"), Some("20"));
        assert_eq!(value_of(&profile, "CMAKE_CXX_EXTENSIONS"), Some("ON"));
        assert_eq!(value_of(&profile, "BUILD_SHARED_LIBS"), Some("OFF"));
        assert_eq!(value_of(&profile, "CMAKE_POSITION_INDEPENDENT_CODE"), Some("ON"));
        assert_eq!(value_of(&profile, "CMAKE_CXX_VISIBILITY_PRESET"), Some("hidden"));
        assert_eq!(profile.build_type(), "Debug");
    }

    #[test]
    fn test_pruned_fpic_not_defined() {
        let settings = Settings::from_pairs([("os", "Windows")]);
        let options = prune(&settings, &declared());
        let profile = BuildProfile::derive(&settings, &options).unwrap();
        assert!(value_of(&profile, "CMAKE_POSITION_INDEPENDENT_CODE").is_none());
        assert_eq!(profile.build_type(), "Release");
    }

    #[test]
    fn test_package_id_ignores_pruned_options() {
        let settings = Settings::from_pairs([("os", "Linux")]);
        let a = declared()
            .with_overrides(&[("shared", "True"), ("fPIC", "True")])
            .unwrap();
        let b = declared()
            .with_overrides(&[("shared", "True"), ("fPIC", "False")])
            .unwrap();

        let id_a = BuildProfile::derive(&settings, &prune(&settings, &a)).unwrap().package_id();
        let id_b = BuildProfile::derive(&settings, &prune(&settings, &b)).unwrap().package_id();
        assert_eq!(id_a, id_b);
        assert_eq!(id_a.len(), 64);
    }

    #[test]
    fn test_package_id_differs_by_settings() {
        let options = declared();
        let linux = Settings::from_pairs([("os", "Linux")]);
        let release = Settings::from_pairs([("os", "Linux"), ("build_type", "Release")]);
        assert_ne!(
            BuildProfile::derive(&linux, &options).unwrap().package_id(),
            BuildProfile::derive(&release, &options).unwrap().package_id()
        );
    }

    #[test]
    fn test_invalid_cppstd_fails_derive() {
        let settings = Settings::from_pairs([("compiler.cppstd", "latest")]);
        assert!(BuildProfile::derive(&settings, &declared()).is_err());
    }

    #[test]
    fn test_native_build_can_run() {
        assert!(!is_cross_building(&Settings::host()));
        assert!(can_run(&Settings::host(), None));
        assert!(can_run(&Settings::empty(), None));
    }

    #[test]
    fn test_cross_build_cannot_run() {
        let host = Settings::host();
        let other_arch = if host.arch() == Some("s390x") { "x86_64" } else { "s390x" };
        let target = Settings::from_pairs([("arch", other_arch)]);
        assert!(is_cross_building(&target));
        assert!(!can_run(&target, None));
        assert!(can_run(&target, Some(true)));
    }
}

//! The build matrix: toolchains x build types x link types.
//!
//! Every non-interface package is built once per [`Variant`], each in its
//! own build tree, so a consumer can pick any combination at its own
//! configure time.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A compiler pair the matrix builds with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    /// Directory name under `build/` and `lib/`, and the value of the
    /// consumer's `TOOLCHAIN` variable.
    pub name: String,

    /// C compiler.
    pub cc: String,

    /// C++ compiler.
    pub cxx: String,

    /// CMake compiler id matched by the generated descriptor (`Clang`, `GNU`).
    pub compiler_id: String,
}

impl Toolchain {
    pub fn new(
        name: impl Into<String>,
        cc: impl Into<String>,
        cxx: impl Into<String>,
        compiler_id: impl Into<String>,
    ) -> Self {
        Toolchain {
            name: name.into(),
            cc: cc.into(),
            cxx: cxx.into(),
            compiler_id: compiler_id.into(),
        }
    }

    pub fn clang() -> Self {
        Toolchain::new("clang", "clang", "clang++", "Clang")
    }

    pub fn gcc() -> Self {
        Toolchain::new("gcc", "gcc", "g++", "GNU")
    }
}

/// Static or shared linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Static,
    Shared,
}

impl LinkType {
    pub fn from_static(link_static: bool) -> Self {
        if link_static {
            LinkType::Static
        } else {
            LinkType::Shared
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Static => "static",
            LinkType::Shared => "shared",
        }
    }

    /// Value for `BUILD_SHARED_LIBS`.
    pub fn shared_libs_flag(&self) -> &'static str {
        match self {
            LinkType::Static => "OFF",
            LinkType::Shared => "ON",
        }
    }

    /// Library type keyword in `add_library(... IMPORTED)`.
    pub fn cmake_keyword(&self) -> &'static str {
        match self {
            LinkType::Static => "STATIC",
            LinkType::Shared => "SHARED",
        }
    }

    /// File name of the built library for `name`.
    pub fn library_file(&self, name: &str) -> String {
        match self {
            LinkType::Static => format!("lib{}.a", name),
            LinkType::Shared => format!("lib{}.so", name),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(LinkType::Static),
            "shared" => Ok(LinkType::Shared),
            _ => Err(format!(
                "invalid link type '{}'; expected 'static' or 'shared'",
                s
            )),
        }
    }
}

/// One cell of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant<'a> {
    pub toolchain: &'a Toolchain,
    pub build_type: &'a str,
    pub link_type: LinkType,
}

impl Variant<'_> {
    /// `build/<toolchain>/<build-type>/<link-type>` under a package's
    /// cache directory.
    pub fn build_dir(&self, package_dir: &Path) -> PathBuf {
        package_dir
            .join("build")
            .join(&self.toolchain.name)
            .join(self.build_type)
            .join(self.link_type.as_str())
    }
}

impl fmt::Display for Variant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.toolchain.name, self.build_type, self.link_type
        )
    }
}

/// The full set of variants to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMatrix {
    pub toolchains: Vec<Toolchain>,
    pub build_types: Vec<String>,
    pub link_types: Vec<LinkType>,
}

impl BuildMatrix {
    /// Every variant, toolchain-major.
    pub fn variants(&self) -> impl Iterator<Item = Variant<'_>> + '_ {
        self.toolchains.iter().flat_map(move |toolchain| {
            self.build_types.iter().flat_map(move |build_type| {
                self.link_types.iter().map(move |&link_type| Variant {
                    toolchain,
                    build_type,
                    link_type,
                })
            })
        })
    }

    pub fn len(&self) -> usize {
        self.toolchains.len() * self.build_types.len() * self.link_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BuildMatrix {
    fn default() -> Self {
        BuildMatrix {
            toolchains: vec![Toolchain::clang(), Toolchain::gcc()],
            build_types: vec!["Debug".to_string(), "Release".to_string()],
            link_types: vec![LinkType::Static, LinkType::Shared],
        }
    }
}

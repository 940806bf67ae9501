//! Package manifest: the bundles of a package and their dependency graph.

use crate::{BundleError, BundleResult, FORMAT_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Source of per-bundle dependency and hash information.
///
/// Pinning only ever asks for direct dependencies; transitive closure is
/// computed by the caller.
pub trait DependencyLookup: Send + Sync {
    /// Direct dependencies of `bundle`, or `None` if the bundle is unknown.
    fn direct_dependencies(&self, bundle: &str) -> Option<Vec<String>>;

    /// Content hash of `bundle`, if recorded.
    fn content_hash(&self, bundle: &str) -> Option<String>;

    /// Every bundle name known to this lookup.
    fn bundle_names(&self) -> Vec<String>;
}

/// Manifest of one package.
///
/// ```json
/// {
///   "format_version": "1.0",
///   "package": "Default",
///   "bundles": {
///     "characters": { "dependencies": ["shared-materials"], "hash": "sha256:..." },
///     "shared-materials": {}
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Manifest format version.
    #[serde(default = "default_format_version")]
    pub format_version: String,

    /// Package name.
    pub package: String,

    /// Bundles keyed by name.
    #[serde(default)]
    pub bundles: BTreeMap<String, BundleEntry>,
}

/// One bundle in a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Direct dependencies, in the order they were recorded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Content hash ("sha256:<hex>").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

fn default_format_version() -> String {
    FORMAT_VERSION.to_string()
}

impl BundleManifest {
    /// Create an empty manifest for a package.
    #[must_use]
    pub fn new(package: &str) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            package: package.to_string(),
            bundles: BTreeMap::new(),
        }
    }

    /// Add or replace a bundle entry.
    #[must_use]
    pub fn with_bundle(mut self, name: &str, dependencies: &[&str], hash: Option<&str>) -> Self {
        self.insert_bundle(name, dependencies, hash);
        self
    }

    /// Add or replace a bundle entry in place.
    pub fn insert_bundle(&mut self, name: &str, dependencies: &[&str], hash: Option<&str>) {
        self.bundles.insert(
            name.to_string(),
            BundleEntry {
                dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
                hash: hash.map(str::to_string),
            },
        );
    }

    /// Look up one bundle entry.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&BundleEntry> {
        self.bundles.get(name)
    }

    /// Check that the package is named and the dependency graph is closed
    /// and acyclic.
    pub fn validate(&self) -> BundleResult<()> {
        if self.package.is_empty() {
            return Err(BundleError::InvalidManifest(
                "package name is required".to_string(),
            ));
        }

        for (name, entry) in &self.bundles {
            if name.is_empty() {
                return Err(BundleError::InvalidManifest(
                    "bundle names must not be empty".to_string(),
                ));
            }
            for dep in &entry.dependencies {
                if dep == name {
                    return Err(BundleError::InvalidManifest(format!(
                        "bundle '{name}' depends on itself"
                    )));
                }
                if !self.bundles.contains_key(dep) {
                    return Err(BundleError::InvalidManifest(format!(
                        "bundle '{name}' depends on unknown bundle '{dep}'"
                    )));
                }
            }
        }

        self.check_acyclic()
    }

    fn check_acyclic(&self) -> BundleResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();

        for root in self.bundles.keys() {
            if marks.contains_key(root.as_str()) {
                continue;
            }

            // (bundle, index of next dependency to visit)
            let mut path: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
            marks.insert(root.as_str(), Mark::Visiting);

            while let Some((name, next)) = path.last_mut() {
                let deps = self
                    .bundles
                    .get(*name)
                    .map(|e| e.dependencies.as_slice())
                    .unwrap_or_default();

                if *next >= deps.len() {
                    marks.insert(*name, Mark::Done);
                    path.pop();
                    continue;
                }

                let dep = deps[*next].as_str();
                *next += 1;

                match marks.get(dep) {
                    Some(Mark::Done) => {}
                    Some(Mark::Visiting) => {
                        let start = path.iter().position(|(n, _)| *n == dep).unwrap_or(0);
                        let mut chain: Vec<String> =
                            path[start..].iter().map(|(n, _)| n.to_string()).collect();
                        chain.push(dep.to_string());
                        return Err(BundleError::DependencyCycle(chain));
                    }
                    None => {
                        marks.insert(dep, Mark::Visiting);
                        path.push((dep, 0));
                    }
                }
            }
        }

        Ok(())
    }

    /// Transitive dependency closure of `root`, root first, each bundle once.
    pub fn dependency_closure(&self, root: &str) -> BundleResult<Vec<String>> {
        if !self.bundles.contains_key(root) {
            return Err(BundleError::UnknownBundle(root.to_string()));
        }

        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![root.to_string()];

        while let Some(name) = stack.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let entry = self
                .bundles
                .get(&name)
                .ok_or_else(|| BundleError::UnknownBundle(name.clone()))?;
            for dep in entry.dependencies.iter().rev() {
                if !seen.contains(dep) {
                    stack.push(dep.clone());
                }
            }
            order.push(name);
        }

        Ok(order)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> BundleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate JSON.
    pub fn from_json(json: &str) -> BundleResult<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read and validate a manifest file.
    pub fn load<P: AsRef<Path>>(path: P) -> BundleResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write the manifest, creating parent directories.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> BundleResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl DependencyLookup for BundleManifest {
    fn direct_dependencies(&self, bundle: &str) -> Option<Vec<String>> {
        self.bundles.get(bundle).map(|e| e.dependencies.clone())
    }

    fn content_hash(&self, bundle: &str) -> Option<String> {
        self.bundles.get(bundle).and_then(|e| e.hash.clone())
    }

    fn bundle_names(&self) -> Vec<String> {
        self.bundles.keys().cloned().collect()
    }
}

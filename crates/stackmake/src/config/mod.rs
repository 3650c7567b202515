//! TOML design loader. A design document describes hardware/software
//! instances, their file sets and scoped build commands, and the API
//! connections between software instances. Documents may chain through a
//! root-level `extends` reference; child tables override parent tables.
//!
//! This is the outer input layer; the pipeline itself only ever sees the
//! resulting `model::Design`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use toml::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{
    ApiEndpoint, ApiRole, BuildCommand, DependencyEdge, Design, FileRecord, FileSet, HardwareNode,
    SoftwareNode, TypedBuild, ViewBuild,
};

const DEFAULT_FILE_TYPE: &str = "cSource";

fn default_file_type() -> String {
    DEFAULT_FILE_TYPE.to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DesignFile {
    pub design: DesignMeta,
    pub hardware: Vec<HardwareDoc>,
    pub software: Vec<SoftwareDoc>,
    pub connections: Vec<ConnectionDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DesignMeta {
    pub name: String,
}

impl Default for DesignMeta {
    fn default() -> Self {
        Self {
            name: "design".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildDoc {
    pub file_type: String,
    pub command: String,
    pub flags: String,
    pub replace: bool,
}

impl Default for BuildDoc {
    fn default() -> Self {
        Self {
            file_type: default_file_type(),
            command: String::new(),
            flags: String::new(),
            replace: false,
        }
    }
}

/// File-level override; applies to the file regardless of type.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FileBuildDoc {
    pub command: String,
    pub flags: String,
    pub replace: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ViewDoc {
    pub name: String,
    pub build: Vec<BuildDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileDoc {
    pub path: String,
    pub file_type: String,
    pub include: bool,
    pub build: Option<FileBuildDoc>,
}

impl Default for FileDoc {
    fn default() -> Self {
        Self {
            path: String::new(),
            file_type: default_file_type(),
            include: false,
            build: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FileSetDoc {
    pub name: String,
    pub builders: Vec<BuildDoc>,
    pub files: Vec<FileDoc>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct HardwareDoc {
    pub instance: String,
    pub view: Option<ViewDoc>,
    pub filesets: Vec<FileSetDoc>,
    /// Instance-level file set references, planned include-only.
    pub headers: Vec<FileSetDoc>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SoftwareDoc {
    pub instance: String,
    /// Instance name of the mapped hardware; empty means unmapped.
    pub hardware: String,
    pub view: Option<ViewDoc>,
    pub filesets: Vec<FileSetDoc>,
    pub api: Vec<ApiDoc>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ApiDoc {
    pub name: String,
    pub role: RoleDoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleDoc {
    #[default]
    Requester,
    Provider,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConnectionDoc {
    pub requester: EndpointRef,
    pub provider: EndpointRef,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EndpointRef {
    pub instance: String,
    pub endpoint: String,
}

fn merge_values(base: &mut Value, child: Value) {
    match (base, child) {
        (Value::Table(base_tbl), Value::Table(child_tbl)) => {
            for (k, v) in child_tbl {
                match base_tbl.get_mut(&k) {
                    Some(existing) => merge_values(existing, v),
                    None => {
                        base_tbl.insert(k, v);
                    }
                }
            }
        }
        (base_slot, child_val) => {
            *base_slot = child_val;
        }
    }
}

fn resolve_ref_path(from_file: &Path, reference: &str) -> PathBuf {
    let p = PathBuf::from(reference);
    if p.is_absolute() {
        p
    } else {
        from_file.parent().unwrap_or_else(|| Path::new(".")).join(p)
    }
}

fn load_value_inner(path: &Path, stack: &mut HashSet<PathBuf>) -> Result<Value> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !stack.insert(canonical.clone()) {
        return Err(Error::msg(format!(
            "design extends cycle detected at {}",
            canonical.display()
        )));
    }

    let data = fs::read_to_string(path)
        .map_err(|e| Error::msg(format!("failed to read design {}: {e}", path.display())))?;
    let mut value: Value = toml::from_str(&data)
        .map_err(|e| Error::msg(format!("TOML parse error in {}: {e}", path.display())))?;

    // Root-level single-parent extends chain; the child wins on overlap.
    let mut out = Value::Table(Default::default());
    if let Some(ext) = value.get("extends").and_then(Value::as_str) {
        let base_path = resolve_ref_path(path, ext);
        out = load_value_inner(&base_path, stack)?;
    }
    if let Some(tbl) = value.as_table_mut() {
        tbl.remove("extends");
    }
    merge_values(&mut out, value);

    stack.remove(&canonical);
    Ok(out)
}

/// Loads and merges a design document to a plain TOML value.
pub fn load_value(path: &Path) -> Result<Value> {
    let mut stack = HashSet::<PathBuf>::new();
    load_value_inner(path, &mut stack)
}

/// Loads a design document from disk, following its `extends` chain.
pub fn load(path: &Path) -> Result<DesignFile> {
    let value = load_value(path)?;
    value
        .try_into()
        .map_err(|e| Error::msg(format!("invalid design {}: {e}", path.display())))
}

fn build_command(doc: &BuildDoc) -> TypedBuild {
    TypedBuild {
        file_type: doc.file_type.clone(),
        build: BuildCommand {
            command: doc.command.clone(),
            flags: doc.flags.clone(),
            replace: doc.replace,
        },
    }
}

fn view(doc: &ViewDoc) -> ViewBuild {
    ViewBuild {
        name: doc.name.clone(),
        builders: doc.build.iter().map(build_command).collect(),
    }
}

fn fileset(doc: &FileSetDoc) -> FileSet {
    FileSet {
        name: doc.name.clone(),
        builders: doc.builders.iter().map(build_command).collect(),
        files: doc
            .files
            .iter()
            .map(|f| FileRecord {
                path: f.path.clone(),
                file_type: f.file_type.clone(),
                include: f.include,
                build: f.build.as_ref().map(|b| BuildCommand {
                    command: b.command.clone(),
                    flags: b.flags.clone(),
                    replace: b.replace,
                }),
            })
            .collect(),
    }
}

impl DesignFile {
    /// Builds the in-memory design graph. Connections naming unknown
    /// instances or endpoints are skipped with a warning; a connection
    /// declared with swapped roles is normalized.
    pub fn into_design(&self) -> Design {
        let mut design = Design {
            name: self.design.name.clone(),
            ..Default::default()
        };

        for hw in &self.hardware {
            design.hardware.push(HardwareNode {
                instance: hw.instance.clone(),
                view: hw.view.as_ref().map(view),
                filesets: hw.filesets.iter().map(fileset).collect(),
                header_sets: hw.headers.iter().map(fileset).collect(),
            });
        }

        for sw in &self.software {
            let hardware = if sw.hardware.is_empty() {
                None
            } else {
                let id = design.hardware_named(&sw.hardware);
                if id.is_none() {
                    warn!(
                        instance = %sw.instance,
                        hardware = %sw.hardware,
                        "software maps to unknown hardware instance"
                    );
                }
                id
            };
            design.software.push(SoftwareNode {
                instance: sw.instance.clone(),
                hardware,
                view: sw.view.as_ref().map(view),
                filesets: sw.filesets.iter().map(fileset).collect(),
                endpoints: sw
                    .api
                    .iter()
                    .map(|a| ApiEndpoint {
                        name: a.name.clone(),
                        role: match a.role {
                            RoleDoc::Requester => ApiRole::Requester,
                            RoleDoc::Provider => ApiRole::Provider,
                        },
                    })
                    .collect(),
            });
        }

        for conn in &self.connections {
            if let Some(edge) = resolve_connection(&design, conn) {
                design.edges.push(edge);
            }
        }

        design
    }
}

fn resolve_connection(design: &Design, conn: &ConnectionDoc) -> Option<DependencyEdge> {
    let a = design.software_named(&conn.requester.instance);
    let b = design.software_named(&conn.provider.instance);
    let (Some(a), Some(b)) = (a, b) else {
        warn!(
            requester = %conn.requester.instance,
            provider = %conn.provider.instance,
            "connection names an unknown software instance, skipping"
        );
        return None;
    };

    let role_a = design.sw(a).endpoint(&conn.requester.endpoint).map(|e| e.role);
    let role_b = design.sw(b).endpoint(&conn.provider.endpoint).map(|e| e.role);
    match (role_a, role_b) {
        (Some(ApiRole::Requester), Some(ApiRole::Provider)) => Some(DependencyEdge {
            requester: a,
            provider: b,
        }),
        // Declared the other way around; normalize.
        (Some(ApiRole::Provider), Some(ApiRole::Requester)) => Some(DependencyEdge {
            requester: b,
            provider: a,
        }),
        _ => {
            warn!(
                requester = %conn.requester.endpoint,
                provider = %conn.provider.endpoint,
                "connection endpoints do not form a requester/provider pair, skipping"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extends_merge_lets_the_child_override() {
        let mut base: Value = toml::from_str(
            r#"
[design]
name = "base"

[[hardware]]
instance = "hardware_0"
"#,
        )
        .unwrap();
        let child: Value = toml::from_str(
            r#"
[design]
name = "child"
"#,
        )
        .unwrap();

        merge_values(&mut base, child);
        let file: DesignFile = base.try_into().unwrap();
        assert_eq!(file.design.name, "child");
        assert_eq!(file.hardware.len(), 1);
    }

    #[test]
    fn load_follows_an_extends_chain_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.toml"),
            "[design]\nname = \"base\"\n\n[[hardware]]\ninstance = \"hardware_0\"\n",
        )
        .unwrap();
        let child = dir.path().join("child.toml");
        fs::write(&child, "extends = \"base.toml\"\n\n[design]\nname = \"child\"\n").unwrap();

        let file = load(&child).unwrap();
        assert_eq!(file.design.name, "child");
        assert_eq!(file.hardware[0].instance, "hardware_0");
    }

    #[test]
    fn an_extends_cycle_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.toml");
        fs::write(&a, "extends = \"b.toml\"\n").unwrap();
        fs::write(dir.path().join("b.toml"), "extends = \"a.toml\"\n").unwrap();

        assert!(load(&a).is_err());
    }

    #[test]
    fn reversed_connection_roles_are_normalized() {
        let file: DesignFile = toml::from_str(
            r#"
[[software]]
instance = "app_0"
[[software.api]]
name = "up"
role = "requester"

[[software]]
instance = "lib_0"
[[software.api]]
name = "down"
role = "provider"

[[connections]]
requester = { instance = "lib_0", endpoint = "down" }
provider = { instance = "app_0", endpoint = "up" }
"#,
        )
        .unwrap();

        let design = file.into_design();
        assert_eq!(design.edges.len(), 1);
        assert_eq!(design.edges[0].requester, design.software_named("app_0").unwrap());
        assert_eq!(design.edges[0].provider, design.software_named("lib_0").unwrap());
    }

    #[test]
    fn unknown_connection_endpoint_is_skipped() {
        let file: DesignFile = toml::from_str(
            r#"
[[software]]
instance = "app_0"

[[software]]
instance = "lib_0"

[[connections]]
requester = { instance = "app_0", endpoint = "nope" }
provider = { instance = "lib_0", endpoint = "nope" }
"#,
        )
        .unwrap();

        assert!(file.into_design().edges.is_empty());
    }
}

//! In-memory design graph: hardware and software instances, their file
//! sets, scoped build commands and API dependency edges. The graph is
//! read-only input for the whole pipeline; nodes are addressed by index
//! into the owning `Design`.

/// Index of a hardware node in `Design::hardware`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HwId(pub usize);

/// Index of a software node in `Design::software`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SwId(pub usize);

/// One override cell of the configuration ladder: a compiler command, a
/// flag string and whether the flags supersede all less-specific scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildCommand {
    pub command: String,
    pub flags: String,
    pub replace: bool,
}

impl BuildCommand {
    pub fn has_command(&self) -> bool {
        !self.command.trim().is_empty()
    }
}

/// A build command bound to one file type.
#[derive(Debug, Clone)]
pub struct TypedBuild {
    pub file_type: String,
    pub build: BuildCommand,
}

/// The selected build view of a node: a name plus per-file-type build
/// commands, declaration order preserved.
#[derive(Debug, Clone, Default)]
pub struct ViewBuild {
    pub name: String,
    pub builders: Vec<TypedBuild>,
}

impl ViewBuild {
    /// First builder declared for the given file type, if any.
    pub fn builder_for(&self, file_type: &str) -> Option<&BuildCommand> {
        self.builders
            .iter()
            .find(|b| b.file_type == file_type)
            .map(|b| &b.build)
    }
}

/// One buildable file inside a file set. Identity for deduplication and
/// conflict detection is `path`.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: String,
    pub file_type: String,
    pub include: bool,
    pub build: Option<BuildCommand>,
}

impl FileRecord {
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(self.path.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileSet {
    pub name: String,
    /// Per-file-type default builders, declaration order preserved.
    pub builders: Vec<TypedBuild>,
    pub files: Vec<FileRecord>,
}

impl FileSet {
    pub fn builder_for(&self, file_type: &str) -> Option<&BuildCommand> {
        self.builders
            .iter()
            .find(|b| b.file_type == file_type)
            .map(|b| &b.build)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRole {
    Requester,
    Provider,
}

#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    pub name: String,
    pub role: ApiRole,
}

#[derive(Debug, Clone, Default)]
pub struct HardwareNode {
    pub instance: String,
    pub view: Option<ViewBuild>,
    pub filesets: Vec<FileSet>,
    /// Instance-level file set references; their files are planned as
    /// include-only records.
    pub header_sets: Vec<FileSet>,
}

#[derive(Debug, Clone, Default)]
pub struct SoftwareNode {
    pub instance: String,
    pub hardware: Option<HwId>,
    pub view: Option<ViewBuild>,
    pub filesets: Vec<FileSet>,
    pub endpoints: Vec<ApiEndpoint>,
}

impl SoftwareNode {
    pub fn endpoint(&self, name: &str) -> Option<&ApiEndpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

/// Directed API dependency: the requester depends on the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub requester: SwId,
    pub provider: SwId,
}

#[derive(Debug, Clone, Default)]
pub struct Design {
    pub name: String,
    pub hardware: Vec<HardwareNode>,
    pub software: Vec<SoftwareNode>,
    pub edges: Vec<DependencyEdge>,
}

impl Design {
    pub fn hw(&self, id: HwId) -> &HardwareNode {
        &self.hardware[id.0]
    }

    pub fn sw(&self, id: SwId) -> &SoftwareNode {
        &self.software[id.0]
    }

    pub fn hardware_named(&self, instance: &str) -> Option<HwId> {
        self.hardware
            .iter()
            .position(|h| h.instance == instance)
            .map(HwId)
    }

    pub fn software_named(&self, instance: &str) -> Option<SwId> {
        self.software
            .iter()
            .position(|s| s.instance == instance)
            .map(SwId)
    }

    /// Provider nodes this software node depends on, edge declaration order.
    pub fn providers_of(&self, id: SwId) -> Vec<SwId> {
        self.edges
            .iter()
            .filter(|e| e.requester == id)
            .map(|e| e.provider)
            .collect()
    }

    /// Incoming-edge count per software node, indexed by `SwId`.
    pub fn in_degrees(&self) -> Vec<usize> {
        let mut deg = vec![0usize; self.software.len()];
        for e in &self.edges {
            deg[e.provider.0] += 1;
        }
        deg
    }
}

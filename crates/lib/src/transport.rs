//! Local image source transports, in the form understood by the
//! containers/image stack (`docker-archive:/path/to/file.tar`).

use std::fmt;

/// A local transport an image can be loaded from.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Transport {
    /// A Docker archive tarball (`docker-archive:`)
    DockerArchive,
    /// An OCI archive tarball (`oci-archive:`)
    OciArchive,
    /// An unpacked image directory (`dir:`)
    Dir,
}

impl Transport {
    /// Every transport, in the order loading tries them.
    pub const LOAD_ORDER: [Transport; 3] =
        [Transport::DockerArchive, Transport::OciArchive, Transport::Dir];

    /// Build the source string for `path`.
    ///
    /// Only OCI archives can carry a reference naming one image inside the
    /// archive; `tag_hint` is ignored for other transports and when empty.
    pub fn source_for(self, path: &str, tag_hint: Option<&str>) -> String {
        match (self, tag_hint.filter(|t| !t.is_empty())) {
            (Transport::OciArchive, Some(tag)) => format!("{self}{path}:{tag}"),
            _ => format!("{self}{path}"),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::DockerArchive => f.write_str("docker-archive:"),
            Transport::OciArchive => f.write_str("oci-archive:"),
            Transport::Dir => f.write_str("dir:"),
        }
    }
}

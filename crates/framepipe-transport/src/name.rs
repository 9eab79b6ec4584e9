//! Pipe naming.
//!
//! Host and client derive the same address from the integer identifier, so
//! the identifier is the only thing that has to cross the process boundary.

use std::fmt;
#[cfg(all(unix, not(target_os = "linux")))]
use std::path::PathBuf;

use rand::Rng;

/// Fixed template prefix shared by both roles.
pub const PIPE_NAME_PREFIX: &str = "framepipe-";

/// Draw a fresh random pipe identifier.
pub fn random_identifier() -> u32 {
    rand::thread_rng().gen()
}

/// The name of a pipe, derived from its identifier.
///
/// On Linux the pipe lives in the abstract socket namespace and leaves
/// nothing on the filesystem. Elsewhere it is a socket file in the temp
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeName {
    id: u32,
}

impl PipeName {
    pub fn new(id: u32) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Bytes placed in `sockaddr_un.sun_path`.
    ///
    /// Abstract names start with a NUL byte and are not NUL-terminated.
    #[cfg(target_os = "linux")]
    pub fn address_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(self.to_string().as_bytes());
        bytes
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    pub fn address_bytes(&self) -> Vec<u8> {
        use std::os::unix::ffi::OsStrExt;

        self.socket_path().as_os_str().as_bytes().to_vec()
    }

    /// Whether the address lives in the abstract namespace.
    pub fn is_abstract(&self) -> bool {
        cfg!(target_os = "linux")
    }

    /// Filesystem location of the socket file.
    #[cfg(all(unix, not(target_os = "linux")))]
    pub fn socket_path(&self) -> PathBuf {
        std::env::temp_dir().join(format!("{self}.sock"))
    }
}

impl fmt::Display for PipeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PIPE_NAME_PREFIX}{}", self.id)
    }
}

use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{LinkError, Result};
use crate::stream::StreamLink;

/// A listening end of a local serial line, backed by a Unix domain socket.
///
/// Each accepted connection is one point-to-point line. The socket file is
/// created with restrictive permissions and removed again on drop, provided
/// nothing replaced it in the meantime.
pub struct UnixLine {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl UnixLine {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on a filesystem-path socket.
    ///
    /// If the path already exists and is a socket it is removed first
    /// (stale socket cleanup); any other file type is refused.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::bind_with_mode(path, Self::DEFAULT_SOCKET_MODE)
    }

    /// Bind and listen with an explicit permission mode.
    pub fn bind_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let path_bytes = path.as_os_str().len();
        if path_bytes >= Self::MAX_PATH_LEN {
            return Err(LinkError::PathTooLong {
                path,
                len: path_bytes,
                max: Self::MAX_PATH_LEN,
            });
        }

        // Remove stale sockets, but never remove non-socket files.
        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(|e| LinkError::Bind {
                path: path.clone(),
                source: e,
            })?;
            if metadata.file_type().is_socket() {
                debug!(?path, "removing stale socket");
                std::fs::remove_file(&path).map_err(|e| LinkError::Bind {
                    path: path.clone(),
                    source: e,
                })?;
            } else {
                return Err(LinkError::Bind {
                    path: path.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                });
            }
        }

        let listener = UnixListener::bind(&path).map_err(|e| LinkError::Bind {
            path: path.clone(),
            source: e,
        })?;

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
            LinkError::Bind {
                path: path.clone(),
                source: e,
            }
        })?;
        let created_metadata = std::fs::symlink_metadata(&path).map_err(|e| LinkError::Bind {
            path: path.clone(),
            source: e,
        })?;
        let created_inode = Some((created_metadata.dev(), created_metadata.ino()));

        info!(?path, "line listening");

        Ok(Self {
            listener,
            path,
            created_inode,
        })
    }

    /// Accept one incoming line (blocking).
    pub fn accept(&self) -> Result<StreamLink> {
        let (stream, _addr) = self.listener.accept().map_err(LinkError::Accept)?;
        debug!("line accepted");
        Ok(StreamLink::new(stream))
    }

    /// Connect to a listening line (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<StreamLink> {
        let path = path.as_ref();
        let stream =
            std::os::unix::net::UnixStream::connect(path).map_err(|e| LinkError::Connect {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(?path, "line connected");
        Ok(StreamLink::new(stream))
    }

    /// The path this line is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixLine {
    fn drop(&mut self) {
        if let Some((expected_dev, expected_ino)) = self.created_inode {
            if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
                if metadata.file_type().is_socket()
                    && metadata.dev() == expected_dev
                    && metadata.ino() == expected_ino
                {
                    debug!(path = ?self.path, "cleaning up socket file");
                    let _ = std::fs::remove_file(&self.path);
                } else {
                    debug!(
                        path = ?self.path,
                        "socket path identity changed; skipping cleanup"
                    );
                }
            }
        }
    }
}

use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::BusStream;

/// Socket path used when `-s` is not given.
pub const DEFAULT_BUS_SOCKET: &str = "/var/run/ubus.sock";

/// `sockaddr_un.sun_path` capacity on Linux.
const MAX_PATH_LEN: usize = 108;

/// Connect to the bus broker listening at `path` (blocking).
pub fn connect(path: impl AsRef<Path>) -> Result<BusStream> {
    let path = path.as_ref();
    check_path_len(path)?;
    let stream = UnixStream::connect(path).map_err(|source| TransportError::Connect {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(?path, "connected to bus socket");
    Ok(BusStream::new(stream))
}

/// Listening side of a bus socket.
///
/// Removes a stale socket at bind time and its own socket file on drop,
/// unless the path was replaced in the meantime.
pub struct BusListener {
    listener: UnixListener,
    path: PathBuf,
    created_inode: (u64, u64),
}

impl BusListener {
    /// Permission mode applied to the created socket path.
    pub const SOCKET_MODE: u32 = 0o600;

    /// Bind and listen on `path`.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_path_len(&path)?;

        let bind_err = |source: std::io::Error| TransportError::Bind {
            path: path.clone(),
            source,
        };

        // Never remove something that is not a socket.
        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(Self::SOCKET_MODE))
            .map_err(bind_err)?;
        let created = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "listening on bus socket");

        Ok(Self {
            listener,
            path,
            created_inode: (created.dev(), created.ino()),
        })
    }

    /// Accept the next client (blocking).
    pub fn accept(&self) -> Result<BusStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "accepted bus client");
        Ok(BusStream::new(stream))
    }

    /// The bound socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BusListener {
    fn drop(&mut self) {
        let Ok(metadata) = std::fs::symlink_metadata(&self.path) else {
            return;
        };
        if metadata.file_type().is_socket() && (metadata.dev(), metadata.ino()) == self.created_inode
        {
            debug!(path = ?self.path, "cleaning up socket file");
            let _ = std::fs::remove_file(&self.path);
        } else {
            debug!(path = ?self.path, "socket path identity changed; skipping cleanup");
        }
    }
}

fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: MAX_PATH_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dslmngr-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_bind_accept_connect() {
        let dir = temp_dir("uds");
        let sock_path = dir.join("bus.sock");

        let listener = BusListener::bind(&sock_path).unwrap();
        assert!(sock_path.exists());

        let path_clone = sock_path.clone();
        let handle = std::thread::spawn(move || {
            let mut client = connect(&path_clone).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        handle.join().unwrap();

        drop(listener);
        assert!(!sock_path.exists(), "socket file should be removed on drop");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_connect_missing_socket() {
        let dir = temp_dir("missing");
        let err = connect(dir.join("nobody.sock")).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
        assert!(matches!(
            err,
            TransportError::Connect { ref source, .. } if source.kind() == std::io::ErrorKind::NotFound
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_path_too_long() {
        let long_path = "/tmp/".to_string() + &"b".repeat(200) + ".sock";
        assert!(matches!(
            BusListener::bind(&long_path),
            Err(TransportError::PathTooLong { .. })
        ));
        assert!(matches!(
            connect(&long_path),
            Err(TransportError::PathTooLong { .. })
        ));
    }

    #[test]
    fn test_bind_default_permissions() {
        let dir = temp_dir("perms");
        let sock_path = dir.join("perm.sock");

        let listener = BusListener::bind(&sock_path).unwrap();
        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bind_rejects_regular_file() {
        let dir = temp_dir("regular");
        let sock_path = dir.join("not-a-socket.sock");
        std::fs::write(&sock_path, b"regular-file").unwrap();

        assert!(matches!(
            BusListener::bind(&sock_path),
            Err(TransportError::Bind { .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bind_replaces_stale_socket() {
        let dir = temp_dir("stale");
        let sock_path = dir.join("stale.sock");

        let first = BusListener::bind(&sock_path).unwrap();
        std::mem::forget(first);
        let second = BusListener::bind(&sock_path).unwrap();
        assert_eq!(second.path(), sock_path.as_path());

        drop(second);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_drop_keeps_replaced_path() {
        let dir = temp_dir("drop-race");
        let sock_path = dir.join("drop.sock");

        let listener = BusListener::bind(&sock_path).unwrap();
        std::fs::remove_file(&sock_path).unwrap();
        std::fs::write(&sock_path, b"replacement").unwrap();

        drop(listener);
        assert!(sock_path.exists(), "replaced path must survive drop");
        let _ = std::fs::remove_dir_all(&dir);
    }
}

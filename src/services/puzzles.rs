//! Coupon puzzle tokens and answer verification.
//!
//! A token is the standard base64 encoding of either `db:<puzzle uuid>` or a
//! path relative to the puzzle root (without extension). File-backed puzzles
//! keep their answer in `<root>/<path>.txt` and their script in `<root>/<path>.py`.

use std::io;
use std::path::{Component, Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sea_orm::ConnectionTrait;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::repositories::CatalogRepository;

const DB_PREFIX: &str = "db:";
pub const ANSWER_EXTENSION: &str = "txt";
pub const SCRIPT_EXTENSION: &str = "py";

/// What a puzzle token points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleRef {
    Database(Uuid),
    File(PathBuf),
}

impl PuzzleRef {
    pub fn encode(&self) -> String {
        let raw = match self {
            PuzzleRef::Database(id) => format!("{}{}", DB_PREFIX, id),
            PuzzleRef::File(path) => path
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        };
        STANDARD.encode(raw)
    }

    pub fn decode(token: &str) -> Result<Self, ServiceError> {
        let bytes = STANDARD.decode(token.trim()).map_err(|e| {
            ServiceError::PuzzleVerificationError(format!("malformed token: {}", e))
        })?;
        let decoded = String::from_utf8(bytes).map_err(|e| {
            ServiceError::PuzzleVerificationError(format!("token is not utf-8: {}", e))
        })?;

        if let Some(id) = decoded.strip_prefix(DB_PREFIX) {
            let id = Uuid::parse_str(id.trim()).map_err(|e| {
                ServiceError::PuzzleVerificationError(format!("invalid puzzle id: {}", e))
            })?;
            return Ok(PuzzleRef::Database(id));
        }

        Ok(PuzzleRef::File(sanitize_relative(&decoded)?))
    }
}

/// Rejects empty, absolute and parent-escaping paths
fn sanitize_relative(raw: &str) -> Result<PathBuf, ServiceError> {
    let path = Path::new(raw);
    if raw.trim().is_empty() {
        return Err(ServiceError::PuzzleVerificationError(
            "empty puzzle path".to_string(),
        ));
    }
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ServiceError::PuzzleVerificationError(format!(
                    "puzzle path must stay under the puzzle root: {}",
                    raw
                )));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(ServiceError::PuzzleVerificationError(
            "empty puzzle path".to_string(),
        ));
    }
    Ok(clean)
}

/// Edge whitespace is ignored, case is not
pub fn answers_match(expected: &str, candidate: &str) -> bool {
    expected.trim() == candidate.trim()
}

/// Resolves puzzle tokens against the database and the puzzle directory
#[derive(Debug, Clone)]
pub struct PuzzleVerifier {
    root: PathBuf,
}

impl PuzzleVerifier {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Checks `answer` against the puzzle referenced by `token`
    #[instrument(skip(self, conn, answer))]
    pub async fn verify<C: ConnectionTrait>(
        &self,
        conn: &C,
        token: &str,
        answer: &str,
    ) -> Result<(), ServiceError> {
        let reference = PuzzleRef::decode(token)?;
        let expected = self.expected_answer(conn, &reference).await?;

        if answers_match(&expected, answer) {
            debug!("puzzle answer accepted");
            Ok(())
        } else {
            debug!("puzzle answer rejected");
            Err(ServiceError::PuzzleMismatch)
        }
    }

    async fn expected_answer<C: ConnectionTrait>(
        &self,
        conn: &C,
        reference: &PuzzleRef,
    ) -> Result<String, ServiceError> {
        match reference {
            PuzzleRef::Database(id) => {
                let puzzle = CatalogRepository::new(conn)
                    .find_puzzle(*id)
                    .await?
                    .filter(|p| p.is_active)
                    .ok_or_else(|| ServiceError::PuzzleNotFound(format!("puzzle {}", id)))?;
                Ok(puzzle.answer)
            }
            PuzzleRef::File(rel) => {
                let path = append_extension(self.root.join(rel), ANSWER_EXTENSION);
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| map_io_error(&path, e))
            }
        }
    }

    /// Lists file puzzles under `<root>/<pool>` as `(relative path, script path)`, sorted by name
    pub async fn file_puzzles(&self, pool: &str) -> Result<Vec<(PathBuf, PathBuf)>, ServiceError> {
        let dir = self.root.join(pool);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(map_io_error(&dir, e)),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| map_io_error(&dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                if path.with_extension(ANSWER_EXTENSION).exists() {
                    found.push((Path::new(pool).join(stem), path));
                } else {
                    warn!(script = %path.display(), "puzzle script has no answer file");
                }
            }
        }
        found.sort();
        Ok(found)
    }
}

/// Appends `.ext`, keeping any dots already in the file name
fn append_extension(path: PathBuf, ext: &str) -> PathBuf {
    let mut raw = path.into_os_string();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

fn map_io_error(path: &Path, err: io::Error) -> ServiceError {
    if err.kind() == io::ErrorKind::NotFound {
        ServiceError::PuzzleNotFound(format!("{}", path.display()))
    } else {
        ServiceError::PuzzleVerificationError(format!("{}: {}", path.display(), err))
    }
}

//! Error types for the render pipeline.
//!
//! Every variant corresponds to one row of the error-kind table: it names the
//! trigger condition, not an implementation detail, and carries whatever
//! context is needed to reconstruct the offending path without allocating
//! when no error occurs.

use std::io;

/// A breadcrumb of VNode path segments leading to an offending node.
pub type NodePath = Vec<String>;

/// Error type for render pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Malformed ZRDL/ZREV: bad magic, unknown opcode, truncated payload.
    #[error("protocol decode error at offset {offset}: {reason}")]
    ProtocolDecode {
        /// Byte offset into the stream where decoding failed.
        offset: usize,
        /// Human-readable description of what was wrong.
        reason: String,
    },

    /// Negative sizes, invalid color values, non-finite numbers in props.
    #[error("prop validation failed at {path:?}: {reason}")]
    PropValidation {
        /// Path to the offending VNode.
        path: NodePath,
        /// What was invalid.
        reason: String,
    },

    /// Two focusable nodes share the same `id`.
    #[error("duplicate focusable id {id:?} at {first_path:?} and {second_path:?}")]
    DuplicateId {
        /// The id that appeared twice.
        id: String,
        /// Path to the first node declaring this id.
        first_path: NodePath,
        /// Path to the second node declaring this id.
        second_path: NodePath,
    },

    /// A composite instance invoked a different number of hooks than its
    /// previous render.
    #[error("hook order mismatch at {path:?}: expected {expected} hooks, got {actual}")]
    HookOrderMismatch {
        /// Path to the composite instance.
        path: NodePath,
        /// Hook count on the previous render.
        expected: usize,
        /// Hook count on this render.
        actual: usize,
    },

    /// State was mutated from within a view function.
    #[error("state mutated during render at {path:?}")]
    UpdateDuringRender {
        /// Path to the composite instance whose render triggered the mutation.
        path: NodePath,
    },

    /// Nesting depth or composite-render depth exceeded its limit.
    #[error("depth exceeded at {path:?}: {depth} > limit {limit}")]
    DepthExceeded {
        /// Path to the node where the limit was crossed.
        path: NodePath,
        /// The depth reached.
        depth: usize,
        /// The configured limit.
        limit: usize,
    },

    /// Layout constraints produced a negative final size or an impossible
    /// grid placement.
    #[error("layout impossible at {path:?}: {reason}")]
    LayoutImpossible {
        /// Path to the offending node.
        path: NodePath,
        /// What made the layout impossible.
        reason: String,
    },

    /// Partial or failed backend byte write.
    #[error("backend write failed: {written} of {attempted} bytes written")]
    BackendWrite {
        /// Bytes actually written.
        written: usize,
        /// Bytes that were attempted.
        attempted: usize,
    },

    /// The backend's frame acknowledgement deadline expired.
    #[error("backend ack timeout for frame {seq} after {elapsed_ms}ms")]
    BackendAckTimeout {
        /// The frame sequence number awaiting acknowledgement.
        seq: u64,
        /// How long the orchestrator waited.
        elapsed_ms: u64,
    },

    /// Underlying I/O error from a backend transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RenderError {
    /// Returns `true` when this error is fatal to the current frame (the
    /// frame is aborted and the previous framebuffer is retained), `false`
    /// when it is recoverable (the orchestrator forces a full invalidation
    /// and retries on the next frame).
    pub fn is_fatal_to_frame(&self) -> bool {
        !matches!(
            self,
            RenderError::BackendWrite { .. } | RenderError::BackendAckTimeout { .. }
        )
    }
}

/// Result type alias for render pipeline operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_rows_are_fatal() {
        assert!(
            RenderError::ProtocolDecode {
                offset: 0,
                reason: "bad magic".into()
            }
            .is_fatal_to_frame()
        );
        assert!(
            RenderError::DuplicateId {
                id: "save".into(),
                first_path: vec![],
                second_path: vec![]
            }
            .is_fatal_to_frame()
        );
        assert!(
            RenderError::DepthExceeded {
                path: vec![],
                depth: 501,
                limit: 500
            }
            .is_fatal_to_frame()
        );
    }

    #[test]
    fn recoverable_rows_are_not_fatal() {
        assert!(
            !RenderError::BackendWrite {
                written: 3,
                attempted: 10
            }
            .is_fatal_to_frame()
        );
        assert!(
            !RenderError::BackendAckTimeout {
                seq: 1,
                elapsed_ms: 500
            }
            .is_fatal_to_frame()
        );
    }

    #[test]
    fn io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: RenderError = io_err.into();
        assert!(matches!(err, RenderError::Io(_)));
    }

    #[test]
    fn display_includes_path() {
        let err = RenderError::PropValidation {
            path: vec!["root".into(), "box".into()],
            reason: "negative width".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("negative width"));
    }
}

//! File resolution registry: maps include targets to readable paths.
//! Precedence, first success wins: native handler → host handler (which
//! may also be the built-in `Nil` or `Unrestricted` resolvers) → engine
//! default, which joins the target onto the including document's
//! directory. Native handlers keep the foreign-boundary buffer contract:
//! they write the resolved path into a size-capped buffer, and writing
//! nothing signals failure.

use std::sync::{Arc, RwLock};

use tracing::trace;

use super::lock::{rw_read, rw_write};
use crate::render::{IncludeResolver, ResolveFailure};

/// Default capacity of the native resolve buffer, terminator included.
pub const DEFAULT_RESOLVE_BUFFER_SIZE: usize = 256;

/// Host-registered resolver: returns the resolved path, or `None` to
/// signal failure for this target.
pub type HostFileCallback = dyn Fn(&str, &str) -> Option<String> + Send + Sync;

/// Native-registered resolver: writes the resolved path into the buffer,
/// or leaves it untouched to signal failure.
pub type NativeFileCallback = dyn Fn(&str, &str, &mut ResolveBuffer) + Send + Sync;

/// The host-slot resolver variants.
#[derive(Clone)]
pub enum HostResolver {
    Callback(Arc<HostFileCallback>),
    /// Resolve nothing; every include fails. Useful to isolate tests from
    /// the filesystem.
    Nil,
    /// Resolve every target verbatim, with no sandboxing.
    Unrestricted,
}

/// Size-capped output slot for native resolvers. Writes beyond
/// `capacity - 1` bytes are truncated on a character boundary, mirroring
/// the C contract's terminator byte.
pub struct ResolveBuffer {
    capacity: usize,
    written: Option<String>,
}

impl ResolveBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            written: None,
        }
    }

    /// Store a resolved path. With a capacity of zero the write is
    /// discarded and the resolution fails.
    pub fn write(&mut self, path: &str) {
        if self.capacity == 0 {
            return;
        }
        let mut end = path.len().min(self.capacity - 1);
        while !path.is_char_boundary(end) {
            end -= 1;
        }
        self.written = Some(path[..end].to_owned());
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn take(self) -> Option<String> {
        self.written
    }
}

pub struct ResolverState {
    host: RwLock<Option<HostResolver>>,
    native: RwLock<Option<Arc<NativeFileCallback>>>,
    buffer_size: RwLock<usize>,
}

impl ResolverState {
    pub fn new() -> Self {
        Self {
            host: RwLock::new(None),
            native: RwLock::new(None),
            buffer_size: RwLock::new(DEFAULT_RESOLVE_BUFFER_SIZE),
        }
    }

    pub fn set_host_resolver(&self, resolver: Option<HostResolver>) {
        *rw_write(&self.host, "file resolver") = resolver;
    }

    pub fn set_native_resolver(&self, resolver: Option<Arc<NativeFileCallback>>) {
        *rw_write(&self.native, "file resolver") = resolver;
    }

    /// Install a new native buffer size, returning the previous one.
    pub fn set_buffer_size(&self, size: usize) -> usize {
        let mut guard = rw_write(&self.buffer_size, "resolve buffer size");
        std::mem::replace(&mut *guard, size)
    }

    pub fn buffer_size(&self) -> usize {
        *rw_read(&self.buffer_size, "resolve buffer size")
    }
}

impl IncludeResolver for ResolverState {
    fn resolve(&self, current_origin: &str, target: &str) -> Result<String, ResolveFailure> {
        if let Some(native) = rw_read(&self.native, "file resolver").as_ref() {
            let mut buffer = ResolveBuffer::new(self.buffer_size());
            native(current_origin, target, &mut buffer);
            return match buffer.take() {
                Some(resolved) => {
                    trace!(current_origin, target, resolved = %resolved, layer = "native", "Include resolved");
                    Ok(resolved)
                }
                None => Err(ResolveFailure::NativeDeclined {
                    target: target.to_owned(),
                }),
            };
        }

        match rw_read(&self.host, "file resolver").as_ref() {
            Some(HostResolver::Callback(callback)) => match callback(current_origin, target) {
                Some(resolved) => {
                    trace!(current_origin, target, resolved = %resolved, layer = "host", "Include resolved");
                    Ok(resolved)
                }
                None => Err(ResolveFailure::HostDeclined {
                    target: target.to_owned(),
                }),
            },
            Some(HostResolver::Nil) => Err(ResolveFailure::Disabled),
            Some(HostResolver::Unrestricted) => Ok(target.to_owned()),
            None => Ok(join_relative(current_origin, target)),
        }
    }
}

/// Engine-default resolution: strip `current_origin` to and including its
/// last path separator of either platform convention, then append the
/// target. No separator means the current directory.
fn join_relative(current_origin: &str, target: &str) -> String {
    let cut = match (current_origin.rfind('/'), current_origin.rfind('\\')) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    match cut {
        Some(index) => format!("{}{}", &current_origin[..=index], target),
        None => target.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_join_strips_to_the_last_separator() {
        assert_eq!(join_relative("docs/guide/index.md", "part.md"), "docs/guide/part.md");
        assert_eq!(join_relative("docs\\guide\\index.md", "part.md"), "docs\\guide\\part.md");
        assert_eq!(join_relative("index.md", "part.md"), "part.md");
        assert_eq!(join_relative("<string>", "part.md"), "part.md");
    }

    #[test]
    fn native_resolver_wins_over_host() {
        let state = ResolverState::new();
        state.set_host_resolver(Some(HostResolver::Unrestricted));
        state.set_native_resolver(Some(Arc::new(|_c: &str, t: &str, out: &mut ResolveBuffer| {
            out.write(&format!("native/{t}"));
        })));

        let resolved = state.resolve("a/b.md", "c.md").expect("native resolves");
        assert_eq!(resolved, "native/c.md");
    }

    #[test]
    fn silent_native_resolver_fails_the_target() {
        let state = ResolverState::new();
        state.set_native_resolver(Some(Arc::new(|_: &str, _: &str, _: &mut ResolveBuffer| {})));
        assert!(matches!(
            state.resolve("a.md", "b.md"),
            Err(ResolveFailure::NativeDeclined { .. })
        ));
    }

    #[test]
    fn zero_buffer_size_fails_every_native_resolution() {
        let state = ResolverState::new();
        assert_eq!(state.set_buffer_size(0), DEFAULT_RESOLVE_BUFFER_SIZE);
        state.set_native_resolver(Some(Arc::new(|_c: &str, t: &str, out: &mut ResolveBuffer| {
            out.write(t);
        })));
        assert!(state.resolve("a.md", "b.md").is_err());
    }

    #[test]
    fn buffer_truncates_to_capacity_minus_terminator() {
        let mut buffer = ResolveBuffer::new(8);
        buffer.write("0123456789");
        assert_eq!(buffer.take().as_deref(), Some("0123456"));
    }

    #[test]
    fn nil_and_unrestricted_host_resolvers() {
        let state = ResolverState::new();
        state.set_host_resolver(Some(HostResolver::Nil));
        assert!(matches!(state.resolve("a.md", "b.md"), Err(ResolveFailure::Disabled)));

        state.set_host_resolver(Some(HostResolver::Unrestricted));
        assert_eq!(state.resolve("a/b.md", "c.md").expect("verbatim"), "c.md");
    }

    #[test]
    fn clearing_the_native_slot_restores_host_resolution() {
        let state = ResolverState::new();
        state.set_host_resolver(Some(HostResolver::Unrestricted));
        state.set_native_resolver(Some(Arc::new(|_: &str, _: &str, _: &mut ResolveBuffer| {})));
        assert!(state.resolve("a.md", "b.md").is_err());

        state.set_native_resolver(None);
        assert_eq!(state.resolve("a.md", "b.md").expect("host verbatim"), "b.md");
    }
}

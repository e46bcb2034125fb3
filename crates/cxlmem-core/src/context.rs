//! Device registry
//!
//! A [`Context`] owns every memory device discovered through its backend.
//! Discovery runs once, on the first call to [`Context::memdevs`]; later
//! calls return the cached list. Clones share the same registry, and the
//! devices are dropped together with the last clone.
//!
//! # Example
//!
//! ```ignore
//! let ctx = Context::with_backend(Rc::new(DummyCxl::new(DummyConfig::default())));
//! let mem0 = ctx.find("mem0").ok_or("no such memdev")?;
//! println!("LSA size: {}", mem0.lsa_size());
//! ```

use crate::memdev::Memdev;
use crate::transport::{Discovery, Transport};
use once_cell::unsync::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

struct ContextInner {
    discovery: Rc<dyn Discovery>,
    transport: Rc<dyn Transport>,
    memdevs: OnceCell<Vec<Memdev>>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        let count = self.memdevs.get().map_or(0, Vec::len);
        log::info!("context released ({} memdevs)", count);
    }
}

/// Shared handle to a device registry
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

impl Context {
    /// Create a context from separate discovery and transport backends
    pub fn new(discovery: Rc<dyn Discovery>, transport: Rc<dyn Transport>) -> Self {
        log::info!("context created");
        Self {
            inner: Rc::new(ContextInner {
                discovery,
                transport,
                memdevs: OnceCell::new(),
            }),
        }
    }

    /// Create a context from a backend implementing both traits
    pub fn with_backend<B>(backend: Rc<B>) -> Self
    where
        B: Discovery + Transport + 'static,
    {
        let discovery: Rc<dyn Discovery> = backend.clone();
        let transport: Rc<dyn Transport> = backend;
        Self::new(discovery, transport)
    }

    /// All memory devices, in discovery order
    pub fn memdevs(&self) -> &[Memdev] {
        self.inner.memdevs.get_or_init(|| self.enumerate())
    }

    fn enumerate(&self) -> Vec<Memdev> {
        let mut seen = HashSet::new();
        let mut memdevs = Vec::new();
        for info in self.inner.discovery.discover() {
            if !seen.insert(info.id) {
                log::debug!("{}: duplicate memdev id {}, keeping first", info.devname, info.id);
                continue;
            }
            log::debug!(
                "{}: pmem {} ram {} payload_max {} lsa {}",
                info.devname,
                info.pmem_size,
                info.ram_size,
                info.payload_max,
                info.lsa_size
            );
            memdevs.push(Memdev::new(info, Rc::clone(&self.inner.transport)));
        }
        memdevs
    }

    /// Look up a memory device by id
    pub fn memdev_by_id(&self, id: u32) -> Option<&Memdev> {
        self.memdevs().iter().find(|m| m.id() == id)
    }

    /// Look up a memory device by name (`mem3`) or bare id (`3`)
    pub fn find(&self, name: &str) -> Option<&Memdev> {
        if let Ok(id) = name.parse::<u32>() {
            return self.memdev_by_id(id);
        }
        self.memdevs().iter().find(|m| m.devname() == name)
    }

    /// Number of live handles to this registry
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("enumerated", &self.inner.memdevs.get().is_some())
            .field("refs", &self.ref_count())
            .finish()
    }
}
